use strsim::jaro_winkler;

// Suggestions below this similarity are noise.
const DEFAULT_MIN_SIMILARITY: f64 = 0.85;

/// Optional category-suggestion collaborator.
///
/// Implementations may learn from past assignments, but they live entirely
/// outside the engine's consistency guarantees: a suggestion is advice, the
/// caller still supplies the category that gets stored.
pub trait Categorizer {
    fn suggest(&self, title: &str) -> Option<String>;
    fn record(&mut self, title: &str, category: &str);
}

/// Suggests categories by title similarity to previously recorded pairs.
#[derive(Debug, Default)]
pub struct TitleCategorizer {
    seen: Vec<(String, String)>,
    min_similarity: f64,
}

impl TitleCategorizer {
    pub fn new() -> Self {
        Self {
            seen: Vec::new(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    pub fn with_threshold(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }
}

impl Categorizer for TitleCategorizer {
    fn suggest(&self, title: &str) -> Option<String> {
        let needle = title.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let mut best: Option<(f64, &str)> = None;
        for (seen_title, category) in &self.seen {
            let score = jaro_winkler(&needle, seen_title);
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, category));
            }
        }
        match best {
            Some((score, category)) if score >= self.min_similarity => Some(category.to_string()),
            _ => None,
        }
    }

    fn record(&mut self, title: &str, category: &str) {
        let normalized = title.trim().to_lowercase();
        if normalized.is_empty() || category.trim().is_empty() {
            return;
        }
        let pair = (normalized, category.to_string());
        if !self.seen.contains(&pair) {
            self.seen.push(pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_nearest_recorded_category() {
        let mut categorizer = TitleCategorizer::new();
        categorizer.record("Netflix subscription", "Subscriptions");
        categorizer.record("Whole Foods", "Groceries");

        assert_eq!(
            categorizer.suggest("netflix subscriptions").as_deref(),
            Some("Subscriptions")
        );
        assert_eq!(
            categorizer.suggest("WHOLE FOODS  ").as_deref(),
            Some("Groceries")
        );
    }

    #[test]
    fn distant_titles_get_no_suggestion() {
        let mut categorizer = TitleCategorizer::new();
        categorizer.record("Netflix subscription", "Subscriptions");
        assert_eq!(categorizer.suggest("Plumber invoice"), None);
        assert_eq!(categorizer.suggest(""), None);
    }

    #[test]
    fn duplicate_pairs_are_recorded_once() {
        let mut categorizer = TitleCategorizer::new();
        categorizer.record("Netflix", "Subscriptions");
        categorizer.record("NETFLIX ", "Subscriptions");
        assert_eq!(categorizer.seen.len(), 1);
    }
}
