use super::*;

#[test]
fn empty_name_leaves_suffix_unqualified() {
    assert_eq!(qualify("", "width"), "width");
}

#[test]
fn named_node_prefixes_suffix() {
    assert_eq!(qualify("child", "width"), "child_width");
    assert_eq!(qualify("concat_0", "source"), "concat_0_source");
}

#[test]
fn var_name_replaces_non_word_characters() {
    assert_eq!(var_name("my chart-1"), "my_chart_1");
    assert_eq!(var_name("a.b"), "a_b");
}

#[test]
fn var_name_guards_leading_digit() {
    assert_eq!(var_name("1st"), "_1st");
    assert_eq!(qualify("2d", "height"), "_2d_height");
}
