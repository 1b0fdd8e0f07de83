//! Row encoding
//!
//! Comma-delimited, `\n`-terminated, fields quoted only when they contain a
//! comma, a quote, `\n` or `\r`; embedded quotes are doubled. Output must stay
//! byte-compatible with files written by earlier runs, except that a bare
//! `\r` inside a field is now quoted too.

use contracts::{ContractError, Record};

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new())
}

/// Encode an optional header line followed by one line per record into a
/// single buffer.
pub fn encode_rows<R: Record>(
    sink_name: &str,
    include_header: bool,
    records: &[R],
) -> Result<Vec<u8>, ContractError> {
    let mut wtr = writer();
    let fail = |e: csv::Error| ContractError::sink_write(sink_name, e.to_string());

    if include_header {
        wtr.write_record(R::HEADER).map_err(fail)?;
    }
    for record in records {
        wtr.write_record(record.values()).map_err(fail)?;
    }

    wtr.into_inner()
        .map_err(|e| ContractError::sink_write(sink_name, e.error().to_string()))
}

/// Encoded header line of `R`
pub fn encode_header<R: Record>(sink_name: &str) -> Result<Vec<u8>, ContractError> {
    encode_rows::<R>(sink_name, true, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AuthorContact;

    fn author(name: &str, notes: &str) -> AuthorContact {
        AuthorContact {
            name: name.into(),
            nationality: "German".into(),
            linkedin: "Not found".into(),
            email: "Not found".into(),
            paper_link: "https://arxiv.org/abs/1706.03762".into(),
            notes: notes.into(),
        }
    }

    #[test]
    fn test_header_line() {
        let bytes = encode_header::<AuthorContact>("all").unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Name,Nationality,LinkedIn,Email,Link to Paper,Notes\n"
        );
    }

    #[test]
    fn test_plain_fields_are_not_quoted() {
        let bytes = encode_rows("all", false, &[author("Ashish Vaswani", "")]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Ashish Vaswani,German,Not found,Not found,https://arxiv.org/abs/1706.03762,\n"
        );
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let records = [
            author("Smith, J.", "said \"hi\""),
            author("Line", "first\nsecond"),
        ];
        let text = String::from_utf8(encode_rows("all", false, &records).unwrap()).unwrap();
        let mut lines = text.split_inclusive('\n');
        assert_eq!(
            lines.next(),
            Some(
                "\"Smith, J.\",German,Not found,Not found,https://arxiv.org/abs/1706.03762,\"said \"\"hi\"\"\"\n"
            )
        );
        assert_eq!(
            lines.next(),
            Some("Line,German,Not found,Not found,https://arxiv.org/abs/1706.03762,\"first\n")
        );
        assert_eq!(lines.next(), Some("second\"\n"));
    }

    #[test]
    fn test_carriage_return_is_quoted() {
        let bytes = encode_rows("all", false, &[author("Cr", "a\rb")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with(",\"a\rb\"\n"), "got: {text:?}");

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[5], "a\rb");
    }
}
