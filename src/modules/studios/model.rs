pub use lectern_models::{
    CreateStudioDto, CreateStudioResponse, Studio, StudioResponse, StudioWithHost, UserSummary,
};
