use std::io::{self, Write};

use ::csv::{Terminator, WriterBuilder};

use crate::flatten::FlatRow;

/// Write headers, then every row in header order, as CRLF-terminated CSV.
///
/// Cells are quoted only when they hold a delimiter, quote or line break.
/// Returns the sink once everything is flushed.
pub fn write_csv_records<W: Write>(sink: W, headers: &[String], rows: &[FlatRow]) -> ::csv::Result<W> {
    let mut writer = WriterBuilder::new().terminator(Terminator::CRLF).from_writer(sink);

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|h| row.get(h).unwrap_or_default()))?;
    }

    writer.into_inner().map_err(|err| err.into_error().into())
}

/// [`write_csv_records`] into memory.
pub fn render_csv(headers: &[String], rows: &[FlatRow]) -> ::csv::Result<String> {
    let bytes = write_csv_records(Vec::new(), headers, rows)?;
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn row(cells: &[(&str, &str)]) -> FlatRow {
        FlatRow(cells.iter().map(|(h, v)| (h.to_string(), v.to_string())).collect::<IndexMap<_, _>>())
    }

    #[test]
    fn test_render_follows_header_order() {
        let headers = vec!["B".to_string(), "A".to_string(), "C".to_string()];
        let rows = [row(&[("A", "1"), ("B", "x, y")])];
        assert_eq!(render_csv(&headers, &rows).unwrap(), "B,A,C\r\n\"x, y\",1,\r\n");
    }

    #[test]
    fn quotes_and_line_breaks_are_escaped() {
        let headers = vec!["Note".to_string(), "Id".to_string()];
        let rows = [
            row(&[("Note", "say \"hi\""), ("Id", "1")]),
            row(&[("Note", "two\nlines"), ("Id", "2")]),
        ];
        assert_eq!(
            render_csv(&headers, &rows).unwrap(),
            "Note,Id\r\n\"say \"\"hi\"\"\",1\r\n\"two\nlines\",2\r\n"
        );
    }

    #[test]
    fn test_records_go_to_any_sink() {
        let headers = vec!["Name".to_string()];
        let sink = write_csv_records(Vec::new(), &headers, &[row(&[("Name", "Acme")])]).unwrap();
        assert_eq!(sink, b"Name\r\nAcme\r\n");
    }
}
