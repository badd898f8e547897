/// Kebab-cases `input` the way lodash's `kebabCase` does for directory names.
///
/// Apostrophes are dropped first, so contractions stay one word (`Don't`).
/// Words then break on anything that is not alphanumeric, on lower-to-upper
/// transitions (`fooBar`), before the last capital of an acronym followed by
/// lowercase (`XMLHttp`), and between letters and digits (`team2`).
pub fn kebab_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    Upper,
    Lower,
    Digit,
}

fn classify(c: char) -> Class {
    if c.is_numeric() {
        Class::Digit
    } else if c.is_uppercase() {
        Class::Upper
    } else {
        Class::Lower
    }
}

fn words(input: &str) -> Vec<String> {
    let input = input.replace(['\'', '\u{2019}'], "");
    let mut out = Vec::new();
    for run in input.split(|c: char| !c.is_alphanumeric()) {
        if run.is_empty() {
            continue;
        }
        split_run(run, &mut out);
    }
    out
}

fn split_run(run: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = run.chars().collect();
    let mut current = String::new();

    for (idx, &c) in chars.iter().enumerate() {
        if let Some(&prev) = idx.checked_sub(1).and_then(|p| chars.get(p)) {
            let prev_class = classify(prev);
            let class = classify(c);
            let boundary = match (prev_class, class) {
                (Class::Lower, Class::Upper) => true,
                (Class::Digit, Class::Upper | Class::Lower) => true,
                (Class::Upper | Class::Lower, Class::Digit) => true,
                (Class::Upper, Class::Upper) => chars
                    .get(idx + 1)
                    .is_some_and(|&next| classify(next) == Class::Lower),
                _ => false,
            };
            if boundary && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        out.push(current);
    }
}
