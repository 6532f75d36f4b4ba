use std::fmt::Display;

/// Joins names into a readable list: "EA", "AM and EA", "AM, EA, and MD".
pub fn plain_list_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Display,
{
    let names: Vec<String> = names.into_iter().map(|x| x.to_string()).collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

/// Groups digits by thousands, like "12,345".
pub fn prettyprint_usize(x: usize) -> String {
    let digits = x.to_string();
    let lead = digits.len() % 3;
    let mut result = String::new();
    for (idx, c) in digits.chars().enumerate() {
        if idx != 0 && (idx + 3 - lead) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
