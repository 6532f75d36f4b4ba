use anyhow::Result;

use crate::table::Table;

/// A square zone-by-zone matrix, with zones numbered from 1.
#[derive(Clone, Debug, PartialEq)]
pub struct ODMatrix {
    num_zones: usize,
    // Row-major
    values: Vec<f64>,
}

impl ODMatrix {
    pub fn new(num_zones: usize) -> ODMatrix {
        ODMatrix {
            num_zones,
            values: vec![0.0; num_zones * num_zones],
        }
    }

    /// Reads a matrix stored in long form, one row per zone pair with `origin` and `destination`
    /// columns. The `matrix_name` column holds the values. Pairs not listed are 0, and the
    /// matrix is sized by the largest zone mentioned.
    pub fn from_table(data: &Table, matrix_name: &str) -> Result<ODMatrix> {
        let origins = data.i32_column("origin")?;
        let destinations = data.i32_column("destination")?;
        let values = data.f64_column(matrix_name)?;

        let mut num_zones = 0;
        for zone in origins.iter().chain(destinations.iter()) {
            if *zone < 1 {
                bail!("{} refers to zone {}; zones start at 1", data.name(), zone);
            }
            num_zones = num_zones.max(*zone as usize);
        }
        let mut matrix = ODMatrix::new(num_zones);
        for ((o, d), value) in origins.into_iter().zip(destinations).zip(values) {
            matrix.set(o as usize, d as usize, value);
        }
        Ok(matrix)
    }

    pub fn num_zones(&self) -> usize {
        self.num_zones
    }

    fn idx(&self, origin: usize, destination: usize) -> Option<usize> {
        if origin == 0 || destination == 0 || origin > self.num_zones || destination > self.num_zones
        {
            return None;
        }
        Some((origin - 1) * self.num_zones + (destination - 1))
    }

    pub fn set(&mut self, origin: usize, destination: usize, value: f64) {
        match self.idx(origin, destination) {
            Some(idx) => self.values[idx] = value,
            None => panic!(
                "({}, {}) is outside a {}-zone matrix",
                origin, destination, self.num_zones
            ),
        }
    }

    /// None if either zone is outside the matrix.
    pub fn get(&self, origin: i32, destination: i32) -> Option<f64> {
        if origin < 1 || destination < 1 {
            return None;
        }
        self.idx(origin as usize, destination as usize)
            .map(|idx| self.values[idx])
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Every cell with a non-zero value, in row-major order.
    pub fn nonzero_cells(&self) -> impl Iterator<Item = (i32, i32, f64)> + '_ {
        let n = self.num_zones;
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(move |(idx, v)| ((idx / n + 1) as i32, (idx % n + 1) as i32, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_form() {
        let data = Table::from_reader(
            "trips",
            "origin,destination,SOV,HOV\n1,1,0.5,0\n3,2,2.0,1\n2,3,0,4\n".as_bytes(),
        )
        .unwrap();
        let sov = ODMatrix::from_table(&data, "SOV").unwrap();
        assert_eq!(3, sov.num_zones());
        assert_eq!(Some(2.0), sov.get(3, 2));
        assert_eq!(Some(0.0), sov.get(2, 2));
        assert_eq!(None, sov.get(4, 1));
        assert_eq!(None, sov.get(-1, 1));
        assert_eq!(2.5, sov.sum());
        assert_eq!(
            vec![(1, 1, 0.5), (3, 2, 2.0)],
            sov.nonzero_cells().collect::<Vec<_>>()
        );

        let hov = ODMatrix::from_table(&data, "HOV").unwrap();
        assert_eq!(
            vec![(2, 3, 4.0), (3, 2, 1.0)],
            hov.nonzero_cells().collect::<Vec<_>>()
        );
        assert!(ODMatrix::from_table(&data, "Truck").is_err());
    }

    #[test]
    fn zones_start_at_one() {
        let data =
            Table::from_reader("trips", "origin,destination,SOV\n0,1,1\n".as_bytes()).unwrap();
        assert!(ODMatrix::from_table(&data, "SOV").is_err());
    }
}
