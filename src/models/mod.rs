mod link;
mod timestamp;

pub use link::{CreateLinkRequest, CreateLinkResponse, LinkRecord, LinkStatsResponse, LinkView};
