use quickcheck::{Arbitrary, Gen};

use crate::{ColorReading, SensorColor};

/// A deal small enough to run on the simulated turret.
#[derive(Copy, Clone, Debug)]
pub struct DealSize {
    // 1..=10
    pub num_seats: usize,
    // 0..=13
    pub cards_per_seat: usize,
}

impl Arbitrary for DealSize {
    fn arbitrary(g: &mut Gen) -> Self {
        DealSize {
            num_seats: 1 + usize::arbitrary(g) % 10,
            cards_per_seat: usize::arbitrary(g) % 14,
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let num_seats = self.num_seats;
        let smaller_seats = (1..num_seats).map(move |n| (n, None));
        let smaller_cards = (0..self.cards_per_seat).map(|c| (0, Some(c)));
        let current = *self;
        Box::new(smaller_seats.chain(smaller_cards).map(move |(n, c)| match c {
            None => DealSize {
                num_seats: n,
                ..current
            },
            Some(cards_per_seat) => DealSize {
                cards_per_seat,
                ..current
            },
        }))
    }
}

impl Arbitrary for SensorColor {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&[
            SensorColor::Red,
            SensorColor::Green,
            SensorColor::Blue,
            SensorColor::White,
            SensorColor::Yellow,
            SensorColor::Orange,
            SensorColor::Purple,
            SensorColor::Cyan,
            SensorColor::Black,
            SensorColor::Transparent,
            SensorColor::RedViolet,
            SensorColor::Violet,
            SensorColor::BlueViolet,
            SensorColor::BlueGreen,
            SensorColor::YellowGreen,
            SensorColor::YellowOrange,
            SensorColor::RedOrange,
            SensorColor::None,
        ])
        .unwrap()
    }
}

/// Hues are drawn from whole degrees in `[0, 360)`, except the empty-tray band
/// so a deck never looks exhausted halfway through.
impl Arbitrary for ColorReading {
    fn arbitrary(g: &mut Gen) -> Self {
        if bool::arbitrary(g) {
            ColorReading::Named(SensorColor::arbitrary(g))
        } else {
            let hue = loop {
                let hue = (u16::arbitrary(g) % 360) as f64;
                if !(180.0..205.0).contains(&hue) {
                    break hue;
                }
            };
            ColorReading::Hue(hue)
        }
    }
}
