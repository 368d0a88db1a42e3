/// Argument string assertion utilities
#[allow(dead_code)]
pub fn assert_args_contain(args: &str, fragment: &str) {
    assert!(
        args.contains(fragment),
        "Expected arguments to contain '{}' but they didn't.\nArguments: {}",
        fragment,
        args
    );
}

#[allow(dead_code)]
pub fn assert_args_not_contain(args: &str, fragment: &str) {
    assert!(
        !args.contains(fragment),
        "Expected arguments to NOT contain '{}' but they did.\nArguments: {}",
        fragment,
        args
    );
}

/// Value following a flag (e.g. "30" from "-crf 30")
#[allow(dead_code)]
pub fn get_flag_value<'a>(args: &'a str, flag: &str) -> Option<&'a str> {
    let mut tokens = args.split_whitespace();
    tokens.find(|t| *t == flag)?;
    tokens.next()
}

#[allow(dead_code)]
pub fn assert_flag_value(args: &str, flag: &str, expected: &str) {
    match get_flag_value(args, flag) {
        Some(value) => assert_eq!(
            value, expected,
            "Expected {} to be {} but got {}\nArguments: {}",
            flag, expected, value, args
        ),
        None => panic!("Flag '{}' not found in arguments: {}", flag, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_flag_value() {
        let args = "-c:v libx264 -preset medium -crf 23 -c:a copy";
        assert_eq!(get_flag_value(args, "-crf"), Some("23"));
        assert_eq!(get_flag_value(args, "-c:a"), Some("copy"));
        assert_eq!(get_flag_value(args, "-rc"), None);
    }

    #[test]
    #[should_panic(expected = "Expected arguments to contain")]
    fn test_assert_args_contain_fails() {
        assert_args_contain("-c:v libx264", "-rc vbr");
    }
}
