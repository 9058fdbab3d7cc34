// Reading the items from CSV files.

use std::io::Read;

use csv::StringRecord;
use tiered_voting::builder::{describe, ItemsBuilder};

use crate::session::*;

// Column positions of the fields of an item.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct Columns {
    id: Option<usize>,
    title: usize,
    description: Option<usize>,
}

impl Columns {
    fn from_header(record: &StringRecord) -> Option<Columns> {
        let find = |name: &str| record.iter().position(|s| s.eq_ignore_ascii_case(name));
        let title = find("title")?;
        Some(Columns {
            id: find("id"),
            title,
            description: find("description"),
        })
    }

    // Without a header: `title`, `title,description` or `id,title,description`.
    fn from_width(width: usize) -> Columns {
        match width {
            0 | 1 => Columns {
                id: None,
                title: 0,
                description: None,
            },
            2 => Columns {
                id: None,
                title: 0,
                description: Some(1),
            },
            _ => Columns {
                id: Some(0),
                title: 1,
                description: Some(2),
            },
        }
    }
}

pub fn read_csv_items(path: &str) -> SessionResult<Vec<Item>> {
    let file = File::open(path).context(OpeningFileSnafu { path })?;
    parse_csv_items(file)
}

pub fn parse_csv_items<R: Read>(input: R) -> SessionResult<Vec<Item>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut builder = ItemsBuilder::new();
    let mut columns: Option<Columns> = None;
    let mut first_row = true;
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if line.iter().all(|s| s.is_empty()) {
            continue;
        }
        if std::mem::take(&mut first_row) {
            if let Some(c) = Columns::from_header(&line) {
                debug!("read_csv_items: header {:?}", c);
                columns = Some(c);
                continue;
            }
        }
        let cols = *columns.get_or_insert_with(|| Columns::from_width(line.len()));

        let title = line.get(cols.title).context(CsvLineTooShortSnafu { lineno })?;
        if title.is_empty() {
            whatever!("Line {} of the CSV file has no title", lineno);
        }
        let description = match cols.description.and_then(|i| line.get(i)) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => describe(title),
        };
        let id_o = match cols.id.and_then(|i| line.get(i)) {
            Some(s) if !s.is_empty() => Some(s.parse::<u32>().ok().context(CsvBadIdSnafu {
                lineno,
                value: s,
            })?),
            _ => None,
        };
        debug!("read_csv_items: lineno: {} id: {:?} title: {:?}", lineno, id_o, title);
        let added = match id_o {
            Some(id) => builder.add_item(id, title, &description),
            None => builder.add_next(title, &description),
        };
        added.context(VotingSnafu {})?;
    }
    builder.build().context(VotingSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids_and_titles(items: &[Item]) -> Vec<(u32, String)> {
        items.iter().map(|i| (i.id.0, i.title.clone())).collect()
    }

    #[test]
    fn header_with_ids() {
        let input = "id,title,description\n3,Dark mode,Themes\n7,Offline support,\n";
        let items = parse_csv_items(input.as_bytes()).unwrap();
        assert_eq!(
            ids_and_titles(&items),
            vec![(3, "Dark mode".to_string()), (7, "Offline support".to_string())]
        );
        assert_eq!(items[0].description, "Themes");
        assert_eq!(
            items[1].description,
            "A comprehensive solution for offline support."
        );
    }

    #[test]
    fn header_without_ids() {
        let input = "Title , Description\nDark mode,Themes\nOffline support,Sync later\n";
        let items = parse_csv_items(input.as_bytes()).unwrap();
        assert_eq!(
            ids_and_titles(&items),
            vec![(1, "Dark mode".to_string()), (2, "Offline support".to_string())]
        );
    }

    #[test]
    fn no_header() {
        let input = "Dark mode\nOffline support\n\nExport to PDF\n";
        let items = parse_csv_items(input.as_bytes()).unwrap();
        let ids: Vec<u32> = items.iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let input = "10,Dark mode,Themes\n11,Offline support,Sync later\n";
        let items = parse_csv_items(input.as_bytes()).unwrap();
        assert_eq!(items[1].id, ItemId(11));
    }

    #[test]
    fn header_after_blank_rows() {
        let input = ",,\n\nid,title,description\n3,Dark mode,Themes\n";
        let items = parse_csv_items(input.as_bytes()).unwrap();
        assert_eq!(ids_and_titles(&items), vec![(3, "Dark mode".to_string())]);
        assert_eq!(items[0].description, "Themes");
    }

    #[test]
    fn bad_rows() {
        let bad_id = "id,title\nx1,Dark mode\n";
        assert!(matches!(
            parse_csv_items(bad_id.as_bytes()),
            Err(SessionError::CsvBadId { lineno: 2, .. })
        ));
        let duplicate = "id,title\n1,a\n1,b\n";
        assert!(matches!(
            parse_csv_items(duplicate.as_bytes()),
            Err(SessionError::Voting {
                source: VotingErrors::DuplicateItem(ItemId(1))
            })
        ));
        assert!(matches!(
            parse_csv_items("id,title\n".as_bytes()),
            Err(SessionError::Voting {
                source: VotingErrors::EmptyRun
            })
        ));
        let last_id = "id,title\n4294967295,a\n,b\n";
        assert!(matches!(
            parse_csv_items(last_id.as_bytes()),
            Err(SessionError::Voting {
                source: VotingErrors::IdSpaceExhausted
            })
        ));
    }
}
