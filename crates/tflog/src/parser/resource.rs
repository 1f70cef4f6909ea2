//! Resource — infer the Terraform resource address a message talks about.

use super::model::{ResourceOrigin, ResourceRef};
use super::patterns::{DOTTED_TOKEN, VERTEX};

/// Extract a resource identifier from `message`.
///
/// The quoted vertex name wins (`vertex "aws_vpc.main (expand)"` →
/// `aws_vpc.main`). Otherwise the first `word.word` token is returned, tagged
/// [`ResourceOrigin::DottedToken`] since it also matches file names and
/// version strings.
pub fn extract(message: &str) -> Option<ResourceRef> {
    if let Some(caps) = VERTEX.captures(message) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if let Some(first) = name.split_whitespace().next() {
            return Some(ResourceRef::new(first, ResourceOrigin::Vertex));
        }
    }

    DOTTED_TOKEN
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| ResourceRef::new(m.as_str(), ResourceOrigin::DottedToken))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_name_strips_suffix() {
        let found = extract(r#"walk: visiting vertex "aws_instance.web (expand)""#).unwrap();
        assert_eq!(found.id, "aws_instance.web");
        assert_eq!(found.origin, ResourceOrigin::Vertex);
    }

    #[test]
    fn test_vertex_wins_over_dotted_token() {
        let found = extract(r#"main.tf: evaluating vertex "module.net.aws_vpc.this""#).unwrap();
        assert_eq!(found.id, "module.net.aws_vpc.this");
        assert_eq!(found.origin, ResourceOrigin::Vertex);
    }

    #[test]
    fn test_dotted_token_fallback_is_low_confidence() {
        let found = extract("aws_s3_bucket.logs: Creating...").unwrap();
        assert_eq!(found.id, "aws_s3_bucket.logs");
        assert!(found.origin.is_low_confidence());

        // also matches non-resources; kept deliberately loose
        let noisy = extract("loaded plugin v1.2").unwrap();
        assert_eq!(noisy.id, "v1.2");
    }

    #[test]
    fn test_no_resource() {
        assert_eq!(extract("Terraform has been successfully initialized!"), None);
        assert_eq!(extract(r#"vertex """#), None);
    }
}
