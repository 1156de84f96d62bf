use serde_json::value::RawValue;

use crate::error::Error;

/// Response body of the ranked-list endpoint, kept byte for byte. It is only
/// accepted once it parses as a JSON array.
#[derive(Debug, Clone)]
pub struct MarketsPayload {
    pub body: Vec<u8>,
    pub records: usize,
}

impl MarketsPayload {
    pub fn parse(body: Vec<u8>) -> Result<MarketsPayload, Error> {
        let records = serde_json::from_slice::<Vec<&RawValue>>(&body)
            .map_err(|e| Error::MalformedResponse(e.to_string()))?
            .len();

        Ok(MarketsPayload { body, records })
    }
}
