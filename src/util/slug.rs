/// Lowercases `title` and joins its alphanumeric runs with single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Matrix"), "the-matrix");
        assert_eq!(slugify("  Mission: Impossible -- Fallout! "), "mission-impossible-fallout");
        assert_eq!(slugify("Amélie"), "amélie");
        assert_eq!(slugify("2001: A Space Odyssey"), "2001-a-space-odyssey");
        assert_eq!(slugify("!!!"), "");
    }
}
