// Copyright (c) 2022-2023 the cflow authors

#[macro_use]
extern crate indoc;

use cflow::assembly::{parse_listing, write_listing};

#[test]
fn listing_round_trip() {
    let input = indoc! {"
        entry stuff
        TOP:
            free a
            branch TOP
            goto END
        END:
    "};
    let insts = parse_listing(input).unwrap();
    let written = write_listing(&insts);
    let reparsed = parse_listing(&written).unwrap();
    // Locations differ between the two parses, but the shapes must not.
    assert_eq!(
        insts.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
        reparsed.iter().map(|i| i.to_string()).collect::<Vec<_>>()
    );
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let input = indoc! {"
        # a comment

        x = 1
    "};
    let insts = parse_listing(input).unwrap();
    assert_eq!(insts.len(), 1);
    // Positions still refer to the original line numbers.
    assert_eq!(insts[0].loc().line, 3);
}
