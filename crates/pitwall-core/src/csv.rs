//! Feed CSV parsing
//!
//! The live feeds are flat comma-separated text: one header line, then one
//! record per line. There is no quoting or escaping support — a comma always
//! starts a new field. That is a known limitation of the feed format itself,
//! not something this parser tries to paper over.

/// A parsed feed: trimmed header names plus the raw values of each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse raw feed text.
    ///
    /// The input is trimmed as a whole, the first line's comma-split tokens
    /// (trimmed) become the field names, and every following line is split
    /// on commas with each value trimmed. Empty input, or input with only a
    /// header line, yields zero records.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.trim().lines();

        let headers = match lines.next() {
            Some(line) => line.split(',').map(|h| h.trim().to_string()).collect(),
            None => Vec::new(),
        };

        let rows = lines
            .map(|line| line.split(',').map(|v| v.trim().to_string()).collect())
            .collect();

        Self { headers, rows }
    }

    /// Field names from the header line, in feed order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data records (the header line does not count).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the feed carried no data records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record at `index`, if present.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            headers: &self.headers,
            values,
        })
    }

    /// Iterate over all records in feed order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            headers: &self.headers,
            values,
        })
    }
}

/// One record, zipped positionally against the header.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    /// Value of the named field, or `""` when the column does not exist or
    /// the record is missing a trailing field.
    pub fn get(&self, name: &str) -> &'a str {
        self.try_get(name).unwrap_or("")
    }

    /// Value of the named field, or `None` when the header has no such
    /// column. A present column with a missing trailing value yields
    /// `Some("")`, so callers can tell "column absent" from "value blank".
    pub fn try_get(&self, name: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|h| h == name)?;
        Some(self.values.get(index).map(String::as_str).unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_values_trimmed() {
        let table = Table::parse("a , b,c\n 1, 2 ,3 ");
        assert_eq!(table.headers(), &["a", "b", "c"]);
        let row = table.row(0).unwrap();
        assert_eq!(row.get("a"), "1");
        assert_eq!(row.get("b"), "2");
        assert_eq!(row.get("c"), "3");
    }

    #[test]
    fn test_missing_trailing_fields_are_empty() {
        let table = Table::parse("a,b,c\n1,2");
        let row = table.row(0).unwrap();
        assert_eq!(row.get("c"), "");
        assert_eq!(row.try_get("c"), Some(""));
        assert_eq!(row.try_get("d"), None);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(Table::parse("").is_empty());
        assert!(Table::parse("   \n  ").is_empty());
        assert!(Table::parse("a,b,c").is_empty());
    }

    #[test]
    fn test_extra_values_are_ignored() {
        let table = Table::parse("a,b\n1,2,3,4");
        let row = table.row(0).unwrap();
        assert_eq!(row.get("a"), "1");
        assert_eq!(row.get("b"), "2");
    }

    #[test]
    fn test_no_quoting_support() {
        // A comma always splits, even inside what looks like a quoted value.
        let table = Table::parse("a,b\n\"x,y\",z");
        let row = table.row(0).unwrap();
        assert_eq!(row.get("a"), "\"x");
        assert_eq!(row.get("b"), "y\"");
    }
}
