/// One row of the input list, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub raw_address: String,
    pub display_name: String,
}

const DELIMITER_CANDIDATES: [char; 3] = [';', ',', '\t'];
const ADDRESS_HEADERS: [&str; 5] = ["telefone", "numero", "phone", "number", "address"];
const NAME_HEADERS: [&str; 2] = ["nome", "name"];

/// Parse a delimited contact list.
///
/// The delimiter is sniffed from the first non-blank line (`;`, `,` or tab).
/// If that line looks like a header it drives the column mapping; otherwise
/// columns are positional: address first, optional name second. Blank lines
/// are skipped. Rows with an empty address cell are kept so the run can
/// report them, one outcome per input row.
pub fn parse_contacts(text: &str) -> Vec<Contact> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let first = match lines.next() {
        Some(line) => line,
        None => return Vec::new(),
    };

    let delimiter = sniff_delimiter(first);
    let first_cells = split_cells(first, delimiter);

    let mut contacts = Vec::new();
    let (address_col, name_col) = match header_columns(&first_cells) {
        Some(mapping) => mapping,
        None => {
            // No header; the first line is data.
            contacts.push(contact_from_cells(&first_cells, 0, 1));
            (0, 1)
        }
    };

    for line in lines {
        let cells = split_cells(line, delimiter);
        contacts.push(contact_from_cells(&cells, address_col, name_col));
    }
    contacts
}

fn sniff_delimiter(line: &str) -> Option<char> {
    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .map(|candidate| (candidate, line.matches(candidate).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(candidate, _)| candidate)
}

fn split_cells(line: &str, delimiter: Option<char>) -> Vec<&str> {
    match delimiter {
        Some(delimiter) => line.split(delimiter).map(str::trim).collect(),
        None => vec![line.trim()],
    }
}

/// Returns `(address_col, name_col)` when the cells look like a header row.
fn header_columns(cells: &[&str]) -> Option<(usize, usize)> {
    let address_col = cells
        .iter()
        .position(|cell| ADDRESS_HEADERS.contains(&cell.to_ascii_lowercase().as_str()))?;
    let name_col = cells
        .iter()
        .position(|cell| NAME_HEADERS.contains(&cell.to_ascii_lowercase().as_str()))
        .unwrap_or(if address_col == 0 { 1 } else { 0 });
    Some((address_col, name_col))
}

fn contact_from_cells(cells: &[&str], address_col: usize, name_col: usize) -> Contact {
    Contact {
        raw_address: cells.get(address_col).copied().unwrap_or("").to_string(),
        display_name: cells.get(name_col).copied().unwrap_or("").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_contacts, sniff_delimiter};

    #[test]
    fn sniffs_most_frequent_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c,d"), Some(';'));
        assert_eq!(sniff_delimiter("a\tb"), Some('\t'));
        assert_eq!(sniff_delimiter("single"), None);
    }

    #[test]
    fn single_column_file_yields_empty_names() {
        let contacts = parse_contacts("62987654321\n62987654322\n");
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|c| c.display_name.is_empty()));
    }
}
