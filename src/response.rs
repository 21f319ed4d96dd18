use rand::Rng;

/// The answers the bot can give to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Response {
    Feur,
    Coubeh,
}

impl Response {
    pub const ALL: [Response; 2] = [Response::Feur, Response::Coubeh];

    /// Stable identifier, used for storage and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Response::Feur => "feur",
            Response::Coubeh => "coubeh",
        }
    }

    /// What actually gets posted in the channel.
    pub fn text(&self) -> &'static str {
        match self {
            Response::Feur => "feur 😂",
            Response::Coubeh => "coubeh 😂",
        }
    }
}

/// Pick a response uniformly at random.
pub fn pick_response<R: Rng>(rng: &mut R) -> Response {
    Response::ALL[rng.gen_range(0..Response::ALL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tags_and_texts_are_distinct() {
        assert_eq!(Response::Feur.tag(), "feur");
        assert_eq!(Response::Coubeh.tag(), "coubeh");
        assert_eq!(Response::Feur.text(), "feur 😂");
        assert_eq!(Response::Coubeh.text(), "coubeh 😂");
        assert_ne!(Response::Feur.tag(), Response::Feur.text());
    }

    #[test]
    fn yields_both_responses_over_many_draws() {
        let mut rng = StdRng::seed_from_u64(7);
        let picks: Vec<Response> = (0..1000).map(|_| pick_response(&mut rng)).collect();

        assert!(picks.contains(&Response::Feur));
        assert!(picks.contains(&Response::Coubeh));
        assert!(picks.iter().all(|r| Response::ALL.contains(r)));
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);

        let first: Vec<Response> = (0..50).map(|_| pick_response(&mut a)).collect();
        let second: Vec<Response> = (0..50).map(|_| pick_response(&mut b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_source_always_picks_first() {
        let mut rng = StepRng::new(0, 0);

        for _ in 0..10 {
            assert_eq!(pick_response(&mut rng), Response::Feur);
        }
    }
}
