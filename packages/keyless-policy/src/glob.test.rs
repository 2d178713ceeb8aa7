use rstest::rstest;

use crate::glob::matches;

#[rstest]
#[case("@org/x", "@org/*", true)]
#[case("@org2/x", "@org/*", false)]
#[case("lodash-x", "lodash*", true)]
#[case("lodash", "lodash*", true)]
#[case("x", "*", true)]
#[case("exact", "exact", true)]
#[case("exact", "other", false)]
#[case("@org/x", "@org2/*", false)]
fn glob_matches_spec_table(#[case] name: &str, #[case] pattern: &str, #[case] expected: bool) {
    assert_eq!(matches(name, pattern), expected);
}
