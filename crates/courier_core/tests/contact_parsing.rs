use courier_core::parse_contacts;

#[test]
fn semicolon_rows_are_positional_without_header() {
    let contacts = parse_contacts("62987654321;Ana\n62987654322;Bia\n");
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].raw_address, "62987654321");
    assert_eq!(contacts[0].display_name, "Ana");
    assert_eq!(contacts[1].display_name, "Bia");
}

#[test]
fn header_row_drives_column_mapping() {
    let contacts = parse_contacts("nome,telefone\nAna,62987654321\n");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].raw_address, "62987654321");
    assert_eq!(contacts[0].display_name, "Ana");
}

#[test]
fn english_headers_are_recognized() {
    let contacts = parse_contacts("phone;name\n62987654321;Ana\n");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].raw_address, "62987654321");
}

#[test]
fn blank_lines_are_skipped() {
    let contacts = parse_contacts("\n62987654321;Ana\n\n   \n62987654322;Bia\n\n");
    assert_eq!(contacts.len(), 2);
}

#[test]
fn tab_delimited_input_is_sniffed() {
    let contacts = parse_contacts("62987654321\tAna\n");
    assert_eq!(contacts[0].raw_address, "62987654321");
    assert_eq!(contacts[0].display_name, "Ana");
}

#[test]
fn row_with_empty_address_cell_is_kept_for_reporting() {
    let contacts = parse_contacts("62987654321;Ana\n;Sem Numero\n");
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[1].raw_address, "");
    assert_eq!(contacts[1].display_name, "Sem Numero");
}

#[test]
fn empty_input_yields_no_contacts() {
    assert!(parse_contacts("").is_empty());
    assert!(parse_contacts("\n  \n").is_empty());
}

#[test]
fn preserves_input_order() {
    let contacts = parse_contacts("3;C\n1;A\n2;B\n");
    let names: Vec<_> = contacts.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}
