use proptest::prelude::*;

use callbackd::exec::{tokenize, TokenizeError};

fn word() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_./=-]{1,12}"
}

proptest! {
    #[test]
    fn trailing_comment_never_reaches_the_command(
        words in proptest::collection::vec(word(), 1..6),
        comment in "[^\n]{0,30}",
    ) {
        let template = format!("{} #{}", words.join(" "), comment);
        prop_assert_eq!(tokenize(&template).unwrap(), words);
    }

    #[test]
    fn single_quoted_words_survive_intact(
        program in word(),
        arg in "[A-Za-z0-9 #\"]{1,20}",
    ) {
        let template = format!("{program} '{arg}'");
        prop_assert_eq!(tokenize(&template).unwrap(), vec![program, arg]);
    }

    #[test]
    fn unterminated_quote_is_malformed(
        program in word(),
        arg in "[A-Za-z0-9 ]{0,20}",
    ) {
        let template = format!("{program} \"{arg}");
        prop_assert_eq!(tokenize(&template), Err(TokenizeError::Malformed));
    }
}
