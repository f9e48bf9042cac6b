// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// One step of a two-source arrival schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum Arrival<A, B> {
    Left(A),
    Right(B),
}

/// Random arrival order of two sequences, each kept in its own order.
///
/// The same `seed` always yields the same schedule.
pub fn interleave<A, B>(left: Vec<A>, right: Vec<B>, seed: u64) -> Vec<Arrival<A, B>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    let mut schedule = Vec::new();

    loop {
        let take_left = match (left.peek().is_some(), right.peek().is_some()) {
            (true, true) => rng.bool(),
            (true, false) => true,
            (false, true) => false,
            (false, false) => break,
        };
        let next = if take_left {
            left.next().map(Arrival::Left)
        } else {
            right.next().map(Arrival::Right)
        };
        schedule.extend(next);
    }

    schedule
}
