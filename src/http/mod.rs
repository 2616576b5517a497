//! HTTP layer module
//!
//! Response construction plus the streaming body that drives producers.

pub mod body;
pub mod response;

pub use response::{
    build_404_response, build_405_response, build_directory_response, build_file_response,
    build_options_response, build_redirect_response, queue_response, ResponseBody,
};
