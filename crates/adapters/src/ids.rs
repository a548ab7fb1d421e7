use novellog_application::IdSource;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_non_empty() {
        let ids = UuidIdSource;
        let first = ids.next_id();
        let second = ids.next_id();
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }
}
