//! Payload decoding.
//!
//! Endpoints promise JSON arrays. The catalog is decoded strictly (a
//! half-usable name list helps nobody), while occurrence rows decode
//! element by element: one bad record is logged and skipped instead of
//! poisoning the whole dataset.

use careboard_api::QueryKind;
use careboard_models::RawRow;
use serde_json::Value;

use crate::FetchError;

/// Decodes a disease catalog payload.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the body is not an array of
/// strings.
pub fn parse_names(body: Value) -> Result<Vec<String>, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::Malformed {
        message: format!("{}: {e}", QueryKind::DiseaseNames),
    })
}

/// Decodes an occurrence payload into raw rows.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the body is not an array at all.
/// Elements that fail to decode are skipped with a warning.
pub fn parse_rows(kind: QueryKind, body: Value) -> Result<Vec<RawRow>, FetchError> {
    let Value::Array(elements) = body else {
        return Err(FetchError::Malformed {
            message: format!("{kind}: expected an array of rows"),
        });
    };

    let total = elements.len();
    let mut rows = Vec::with_capacity(total);
    for element in elements {
        match serde_json::from_value::<RawRow>(element) {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!("{kind}: skipping undecodable row: {e}"),
        }
    }

    if rows.len() < total {
        log::warn!("{kind}: kept {} of {total} rows", rows.len());
    }

    Ok(rows)
}
