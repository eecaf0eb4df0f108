const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decode text, stripping a UTF-8 BOM and falling back to GBK
/// when the bytes are not valid UTF-8.
pub fn decode_with_guess_encoding(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            // Spreadsheets saved on zh-CN Windows default to cp936
            let (cow, _, had_errors) = encoding_rs::GBK.decode(bytes);
            if had_errors {
                tracing::warn!("Text is neither UTF-8 nor GBK; undecodable bytes were replaced");
            }
            cow.into_owned()
        }
    }
}
