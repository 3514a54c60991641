use rand::{distributions::Alphanumeric, Rng};

/// Short human-readable position code, e.g. `OP-4K7KQZ`.
pub fn generate_visual_id() -> String {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    format!("OP-{}", code.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_id_shape() {
        let id = generate_visual_id();
        assert_eq!(id.len(), 9);
        assert!(id.starts_with("OP-"));
        assert!(id[3..].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
