use std::iter::FusedIterator;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::DealError;

/// A place at the table the turret deals to.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub index: usize,
    pub heading_deg: f64,
}

/// The seats around the turret, in dealing order. Never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatLayout {
    seats: Vec<Seat>,
}

impl SeatLayout {
    /// `num_seats` seats spread evenly around the circle, seat 0 at heading 0.
    pub fn evenly_spaced(num_seats: usize) -> Result<Self, DealError> {
        if num_seats == 0 {
            return Err(DealError::NoSeats);
        }
        let step = 360.0 / num_seats as f64;
        let seats = (0..num_seats)
            .map(|index| Seat {
                index,
                heading_deg: step * index as f64,
            })
            .collect();
        Ok(Self { seats })
    }

    pub fn explicit(headings: &[f64]) -> Result<Self, DealError> {
        if headings.is_empty() {
            return Err(DealError::NoSeats);
        }
        let seats = headings
            .iter()
            .enumerate()
            .map(|(index, &heading_deg)| Seat { index, heading_deg })
            .collect();
        Ok(Self { seats })
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Panics if `index` is out of range.
    pub fn heading(&self, index: usize) -> f64 {
        self.seats[index].heading_deg
    }
}

/// A run of consecutive cards for the same seat, dealt from one heading.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burst {
    pub seat: usize,
    pub cards: usize,
}

/// Which seat receives each card, in dealing order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAssignment(pub Vec<usize>);

/// Total number of cards in a deal, or an error if it doesn't fit in `usize`.
pub fn total_cards(num_seats: usize, cards_per_seat: usize) -> Result<usize, DealError> {
    num_seats
        .checked_mul(cards_per_seat)
        .ok_or(DealError::TooManyCards {
            num_seats,
            cards_per_seat,
        })
}

/// In-place Fisher-Yates shuffle: walks from the back, swapping each element
/// with a uniformly chosen one at or before it.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

impl CardAssignment {
    /// Round-robin: every seat once per round, `cards_per_seat` rounds.
    pub fn sequential(num_seats: usize, cards_per_seat: usize) -> Result<Self, DealError> {
        let mut seats = Vec::with_capacity(total_cards(num_seats, cards_per_seat)?);
        for _round in 0..cards_per_seat {
            seats.extend(0..num_seats);
        }
        Ok(Self(seats))
    }

    /// Picks seats uniformly at random, throwing away picks for seats that
    /// are already full.
    ///
    /// Every accepted pick lowers the remaining capacity by one and a
    /// rejected pick changes nothing, so this terminates with probability 1.
    pub fn weighted_random<R: Rng + ?Sized>(
        rng: &mut R,
        num_seats: usize,
        cards_per_seat: usize,
    ) -> Result<Self, DealError> {
        let mut remaining = total_cards(num_seats, cards_per_seat)?;
        let mut dealt = vec![0; num_seats];
        let mut seats = Vec::with_capacity(remaining);
        while remaining > 0 {
            let seat = rng.gen_range(0..num_seats);
            if dealt[seat] < cards_per_seat {
                dealt[seat] += 1;
                remaining -= 1;
                seats.push(seat);
            }
        }
        Ok(Self(seats))
    }

    /// A uniformly random ordering of the deck where seat `s` owns exactly
    /// `cards_per_seat` cards.
    pub fn shuffled<R: Rng + ?Sized>(
        rng: &mut R,
        num_seats: usize,
        cards_per_seat: usize,
    ) -> Result<Self, DealError> {
        let mut seats: Vec<usize> = (0..total_cards(num_seats, cards_per_seat)?)
            .map(|i| i / cards_per_seat)
            .collect();
        fisher_yates(&mut seats, rng);
        Ok(Self(seats))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn per_seat_counts(&self, num_seats: usize) -> Vec<usize> {
        let mut counts = vec![0; num_seats];
        for &seat in &self.0 {
            counts[seat] += 1;
        }
        counts
    }

    /// Maximal runs of equal consecutive seats.
    pub fn bursts(&self) -> Bursts<'_> {
        Bursts { rest: &self.0 }
    }

    /// One burst per card, even when consecutive cards share a seat.
    pub fn single_cards(&self) -> impl Iterator<Item = Burst> + '_ {
        self.0.iter().map(|&seat| Burst { seat, cards: 1 })
    }
}

/// Iterator returned by [`CardAssignment::bursts`].
pub struct Bursts<'a> {
    rest: &'a [usize],
}

impl<'a> Iterator for Bursts<'a> {
    type Item = Burst;

    fn next(&mut self) -> Option<Self::Item> {
        let &seat = self.rest.first()?;
        let cards = self.rest.iter().take_while(|&&s| s == seat).count();
        self.rest = &self.rest[cards..];
        Some(Burst { seat, cards })
    }
}

impl<'a> FusedIterator for Bursts<'a> {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quickcheck::quickcheck;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::arbitrary::DealSize;

    quickcheck! {
        fn shuffle_is_a_permutation(size: DealSize, seed: u64) -> bool {
            let mut rng = StdRng::seed_from_u64(seed);
            let assignment = CardAssignment::shuffled(&mut rng, size.num_seats, size.cards_per_seat).unwrap();
            assignment.len() == size.num_seats * size.cards_per_seat
                && assignment
                    .per_seat_counts(size.num_seats)
                    .iter()
                    .all(|&count| count == size.cards_per_seat)
        }

        fn bursts_are_maximal_runs(size: DealSize, seed: u64) -> bool {
            let mut rng = StdRng::seed_from_u64(seed);
            let assignment = CardAssignment::shuffled(&mut rng, size.num_seats, size.cards_per_seat).unwrap();
            let bursts: Vec<Burst> = assignment.bursts().collect();

            let flattened: Vec<usize> = bursts
                .iter()
                .flat_map(|b| std::iter::repeat(b.seat).take(b.cards))
                .collect();
            let maximal = bursts.windows(2).all(|w| w[0].seat != w[1].seat);
            let nonempty = bursts.iter().all(|b| b.cards > 0);

            let mut per_seat = vec![0; size.num_seats];
            for burst in &bursts {
                per_seat[burst.seat] += burst.cards;
            }
            flattened == assignment.0
                && maximal
                && nonempty
                && per_seat.iter().all(|&n| n == size.cards_per_seat)
        }

        fn weighted_random_fills_every_seat(size: DealSize, seed: u64) -> bool {
            let mut rng = StdRng::seed_from_u64(seed);
            let assignment =
                CardAssignment::weighted_random(&mut rng, size.num_seats, size.cards_per_seat).unwrap();
            assignment
                .per_seat_counts(size.num_seats)
                .iter()
                .all(|&count| count == size.cards_per_seat)
        }

        fn fisher_yates_keeps_elements(items: Vec<u8>, seed: u64) -> bool {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut shuffled = items.clone();
            fisher_yates(&mut shuffled, &mut rng);
            let mut sorted = items;
            sorted.sort();
            shuffled.sort();
            shuffled == sorted
        }
    }

    #[test]
    fn sequential_goes_round_the_table() {
        let assignment = CardAssignment::sequential(3, 2).unwrap();
        assert_eq!(assignment.0, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(assignment.bursts().count(), 6);
    }

    #[test]
    fn single_seat_is_one_burst() {
        let mut rng = StdRng::seed_from_u64(7);
        let assignment = CardAssignment::shuffled(&mut rng, 1, 13).unwrap();
        assert_eq!(
            assignment.bursts().collect::<Vec<_>>(),
            vec![Burst { seat: 0, cards: 13 }]
        );
        assert_eq!(assignment.single_cards().count(), 13);
    }

    #[test]
    fn bursts_of_explicit_sequence() {
        let assignment = CardAssignment(vec![2, 2, 0, 1, 1, 1, 2]);
        assert_eq!(
            assignment.bursts().collect::<Vec<_>>(),
            vec![
                Burst { seat: 2, cards: 2 },
                Burst { seat: 0, cards: 1 },
                Burst { seat: 1, cards: 3 },
                Burst { seat: 2, cards: 1 },
            ]
        );
        assert_eq!(CardAssignment::default().bursts().next(), None);
    }

    #[test]
    fn zero_cards_per_seat_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(CardAssignment::shuffled(&mut rng, 4, 0).unwrap().is_empty());
        assert!(CardAssignment::weighted_random(&mut rng, 4, 0).unwrap().is_empty());
        assert!(CardAssignment::sequential(4, 0).unwrap().is_empty());
    }

    #[test]
    fn shuffle_produces_different_orders() {
        let mut rng = StdRng::seed_from_u64(42);
        let first = CardAssignment::shuffled(&mut rng, 4, 13).unwrap();
        let second = CardAssignment::shuffled(&mut rng, 4, 13).unwrap();
        assert_ne!(first, second);
        assert_ne!(first, CardAssignment::sequential(4, 13).unwrap());
    }

    #[test]
    fn layouts() {
        let layout = SeatLayout::evenly_spaced(4).unwrap();
        let headings: Vec<f64> = layout.seats().iter().map(|s| s.heading_deg).collect();
        assert_eq!(headings, vec![0.0, 90.0, 180.0, 270.0]);
        assert_eq!(SeatLayout::evenly_spaced(0), Err(DealError::NoSeats));
        assert_eq!(SeatLayout::explicit(&[]), Err(DealError::NoSeats));
        let layout = SeatLayout::explicit(&[10.0, -45.0]).unwrap();
        assert_eq!(layout.heading(1), -45.0);
        assert_eq!(layout.len(), 2);
    }

    #[test]
    fn fisher_yates_is_uniform() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
        for _ in 0..60_000 {
            let mut items: [u8; 3] = [0, 1, 2];
            fisher_yates(&mut items, &mut rng);
            *counts.entry(items).or_default() += 1;
        }
        // All 3! orders, the identity included, near 10_000 each.
        assert_eq!(counts.len(), 6);
        assert!(counts.contains_key(&[0, 1, 2]));
        for (order, &count) in &counts {
            assert!((9_400..=10_600).contains(&count), "{:?} seen {} times", order, count);
        }
    }

    #[test]
    fn weighted_random_first_pick_is_uniform() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut counts = [0usize; 3];
        for _ in 0..30_000 {
            let assignment = CardAssignment::weighted_random(&mut rng, 3, 2).unwrap();
            counts[assignment.0[0]] += 1;
        }
        for count in counts {
            assert!((9_400..=10_600).contains(&count), "{:?}", counts);
        }
    }

    #[test]
    fn overflowing_deal_is_rejected() {
        assert_eq!(total_cards(4, 13), Ok(52));
        assert_eq!(
            total_cards(usize::MAX, 2),
            Err(DealError::TooManyCards {
                num_seats: usize::MAX,
                cards_per_seat: 2
            })
        );
        let mut rng = StdRng::seed_from_u64(0);
        assert!(CardAssignment::sequential(usize::MAX, 2).is_err());
        assert!(CardAssignment::shuffled(&mut rng, 2, usize::MAX).is_err());
        assert!(CardAssignment::weighted_random(&mut rng, usize::MAX, usize::MAX).is_err());
    }
}
