use rand::Rng;

/// Largest ticket number; tickets are printed as four digits.
pub const MAX_TICKET: u16 = 9999;

/// How many random candidates checkout tries before accepting a duplicate.
pub const MAX_ATTEMPTS: usize = 20;

pub fn format_ticket(n: u16) -> String {
    format!("{:04}", n.min(MAX_TICKET))
}

pub fn random_ticket<R: Rng + ?Sized>(rng: &mut R) -> String {
    format_ticket(rng.gen_range(0..=MAX_TICKET))
}

/// Normalises keypad or QR input: surrounding whitespace is dropped and short
/// numeric input is zero padded so `"42"` finds ticket `"0042"`.
pub fn normalize_ticket(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.len() > 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u16>().ok().map(format_ticket)
}

/// Picks a ticket number not contained in `taken`, giving up after
/// [`MAX_ATTEMPTS`] draws. The boolean is `false` when the returned number is
/// still held by an active order.
pub fn pick_ticket<R, F>(rng: &mut R, mut taken: F) -> (String, bool)
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> bool,
{
    let mut candidate = random_ticket(rng);
    for _ in 1..MAX_ATTEMPTS {
        if !taken(&candidate) {
            return (candidate, true);
        }
        candidate = random_ticket(rng);
    }
    let free = !taken(&candidate);
    (candidate, free)
}
