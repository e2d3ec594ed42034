//! Encoding of the filename header.
//!
//! The server reads [`FILENAME_HEADER`](crate::constants::FILENAME_HEADER)
//! with query-unescape rules, so the client encodes with the
//! URI-component set: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a filename for the filename header.
pub fn encode_filename(name: &str) -> String {
    utf8_percent_encode(name, URI_COMPONENT).to_string()
}
