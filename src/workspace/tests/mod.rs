mod format_proptest;
