/// Random connection id for log correlation.
pub fn rand_id() -> u64 {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn when_many_ids_are_drawn_then_they_do_not_collide() {
        let ids: HashSet<u64> = (0..1000).map(|_| rand_id()).collect();

        assert_eq!(ids.len(), 1000);
    }
}
