//! Failure kind contract tests

#[cfg(test)]
mod tests {
    use protocol::ErrorKind;

    #[test]
    fn test_known_kind_spellings() {
        assert_eq!(ErrorKind::InvalidProcedure.as_str(), "invalidProcedure");
        assert_eq!(ErrorKind::Cancelled.as_str(), "cancelled");
        assert_eq!(ErrorKind::Runtime.as_str(), "runtime");
    }

    #[test]
    fn test_kinds_serialize_as_bare_strings() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::InvalidProcedure).unwrap(),
            r#""invalidProcedure""#
        );
        let kind: ErrorKind = serde_json::from_str(r#""cancelled""#).unwrap();
        assert_eq!(kind, ErrorKind::Cancelled);
    }

    #[test]
    fn test_unknown_kind_survives_verbatim() {
        let kind: ErrorKind = serde_json::from_str(r#""quotaExceeded""#).unwrap();
        assert_eq!(kind, ErrorKind::Other("quotaExceeded".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""quotaExceeded""#);
    }
}
