// Model name composition

/// `prefix.property`, or `property` alone under an empty prefix
pub fn create_property_model_name(prefix: &str, property_name: &str) -> String {
    if prefix.is_empty() {
        property_name.to_string()
    } else if property_name.is_empty() {
        prefix.to_string()
    } else if property_name.starts_with('[') {
        format!("{}{}", prefix, property_name)
    } else {
        format!("{}.{}", prefix, property_name)
    }
}

/// `parent[index]`
pub fn create_index_model_name(parent: &str, index: &str) -> String {
    format!("{}[{}]", parent, index)
}

/// True when `key` is `prefix` itself or lies below it, ignoring ASCII case
pub fn key_matches_prefix(key: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    let Some(head) = key.get(..prefix.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(prefix) {
        return false;
    }
    matches!(key.as_bytes().get(prefix.len()), None | Some(b'.') | Some(b'['))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_model_names() {
        assert_eq!(create_property_model_name("", "Name"), "Name");
        assert_eq!(create_property_model_name("parameter", "Name"), "parameter.Name");
        assert_eq!(create_property_model_name("parameter", ""), "parameter");
        assert_eq!(create_property_model_name("p", "[0]"), "p[0]");
    }

    #[test]
    fn test_index_model_names() {
        assert_eq!(create_index_model_name("", "0"), "[0]");
        assert_eq!(create_index_model_name("Addresses", "key0"), "Addresses[key0]");
    }

    #[test]
    fn test_key_matches_prefix() {
        assert!(key_matches_prefix("parameter.Name", "parameter"));
        assert!(key_matches_prefix("Parameter[0]", "parameter"));
        assert!(key_matches_prefix("parameter", "PARAMETER"));
        assert!(!key_matches_prefix("parameters", "parameter"));
        assert!(!key_matches_prefix("p", "parameter"));
        assert!(key_matches_prefix("anything", ""));
    }
}
