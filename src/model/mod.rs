use serde::Deserialize;
use serde::Serialize;

/// One funding row as served by the dataset endpoint.
///
/// The wire keys contain dots, so they are renamed explicitly. Serializing a
/// record produces the same keys it was read with.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Record {
    #[serde(rename = "s.no")]
    pub sequence_number: i64,
    #[serde(rename = "amt.pledged")]
    pub amount_pledged: f64,
    #[serde(rename = "percentage.funded")]
    pub percentage_funded: f64,
}

impl Record {
    pub fn new(sequence_number: i64, amount_pledged: f64, percentage_funded: f64) -> Self {
        Self {
            sequence_number,
            amount_pledged,
            percentage_funded,
        }
    }
}

pub fn parse_records(body: &[u8]) -> Result<Vec<Record>, serde_json::Error> {
    serde_json::from_slice::<Vec<Record>>(body)
}
