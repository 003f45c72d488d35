//! Virtual card presentation helpers

use super::catalog::CardDetails;

/// Group the card number in blocks of four: `4532 0151 1283 0366`
pub fn format_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text placed on the clipboard by "Copy All Card Details"
pub fn copy_all_text(card: &CardDetails) -> String {
    format!("Card: {}\nExpiry: {}\nCVV: {}", card.number, card.expiry, card.cvv)
}
