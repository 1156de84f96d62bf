pub use self::{blob_location::BlobLocation, markets_payload::MarketsPayload};

mod blob_location;
mod markets_payload;
