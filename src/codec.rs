//! The `description` field on the ledger is a composite: the free text the
//! user typed, optionally followed by an inline image payload behind a
//! fixed separator token. Decoding splits on the first occurrence only, so
//! the token is reserved and rejected from user text before submission
//! (see `processor::validate_new_post`).

/// Separator between the free text and the inline image payload.
pub const IMAGE_SEPARATOR: &str = "|||IMAGE|||";

pub fn encode_description(text: &str, image: Option<&str>) -> String {
    match image {
        Some(image) => format!("{}{}{}", text, IMAGE_SEPARATOR, image),
        None => text.to_string(),
    }
}

pub fn decode_description(description: &str) -> (&str, Option<&str>) {
    match description.split_once(IMAGE_SEPARATOR) {
        Some((text, image)) => (text, Some(image)),
        None => (description, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_without_image() {
        let text = "Completed my first marathon!";
        let encoded = encode_description(text, None);
        assert_eq!(encoded, text);
        assert_eq!(decode_description(&encoded), (text, None));
    }

    #[test]
    fn round_trip_with_image() {
        let text = "Launched my startup";
        let image = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
        let encoded = encode_description(text, Some(image));
        assert_eq!(encoded, format!("{}|||IMAGE|||{}", text, image));
        assert_eq!(decode_description(&encoded), (text, Some(image)));
    }

    #[test]
    fn plain_description_decodes_without_image() {
        assert_eq!(decode_description("just text"), ("just text", None));
    }

    #[test]
    fn decode_splits_on_first_occurrence() {
        let description = "a|||IMAGE|||b|||IMAGE|||c";
        assert_eq!(decode_description(description), ("a", Some("b|||IMAGE|||c")));
    }

    #[test]
    fn empty_image_payload_is_preserved() {
        let encoded = encode_description("text", Some(""));
        assert_eq!(decode_description(&encoded), ("text", Some("")));
    }
}
