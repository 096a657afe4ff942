pub use lectern_models::{
    AuthResponse, GoogleLoginRequest, LoginRequest, MessageResponse, RegisterRequest,
    VerifyRequest, VerifyResponse,
};
