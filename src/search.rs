use crate::models::{Event, Member};

pub trait Searchable {
    fn display_name(&self) -> &str;
}

impl Searchable for Member {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Searchable for Event {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl<T: Searchable + ?Sized> Searchable for &T {
    fn display_name(&self) -> &str {
        (**self).display_name()
    }
}

pub fn matches<T: Searchable + ?Sized>(record: &T, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    record
        .display_name()
        .to_lowercase()
        .contains(&query.to_lowercase())
}

pub fn filter<'a, T: Searchable>(records: &'a [T], query: &str) -> Vec<&'a T> {
    records.iter().filter(|record| matches(*record, query)).collect()
}
