pub mod manifest;
pub mod presign;
pub mod project;
