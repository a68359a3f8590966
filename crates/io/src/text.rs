// Repair of UTF-8 punctuation that was decoded as Windows-1252 somewhere
// upstream (CRM exports are the usual culprit).

const MOJIBAKE: &[(&str, &str)] = &[
    ("\u{e2}\u{20ac}\u{2122}", "'"), // right single quote
    ("\u{e2}\u{20ac}\u{2dc}", "'"), // left single quote
    ("\u{e2}\u{20ac}\u{153}", "\""), // left double quote
    ("\u{e2}\u{20ac}\u{9d}", "\""), // right double quote
    ("\u{e2}\u{20ac}\u{201c}", "\u{2013}"), // en dash
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}"), // em dash
    ("\u{e2}\u{20ac}\u{a6}", "\u{2026}"), // ellipsis
];

/// Replace known mojibake sequences. Returns `None` when nothing changed.
pub fn repair_mojibake(s: &str) -> Option<String> {
    // Every sequence starts with 'â'
    if !s.contains('\u{e2}') {
        return None;
    }
    let mut out = s.to_string();
    for (bad, good) in MOJIBAKE {
        if out.contains(bad) {
            out = out.replace(bad, good);
        }
    }
    (out != s).then_some(out)
}
