
#[derive(Debug)]
pub struct MissingTableError;

impl std::fmt::Display for MissingTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "The page has no calendar table to scrape!")
    }
}

impl std::error::Error for MissingTableError {}
