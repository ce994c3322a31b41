use netcdf::Options;

use nc2xlsx::data::container::NcChar;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const FILL: f32 = -9999.0;
const NAME_LEN: usize = 12;

/// Zone names padded with NULs to a fixed width.
fn zone_names(names: &[&str]) -> Vec<u8> {
    let mut out = Vec::with_capacity(names.len() * NAME_LEN);
    for name in names {
        let mut field = name.as_bytes().to_vec();
        field.resize(NAME_LEN, 0);
        out.extend(field);
    }
    out
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let days: Vec<f64> = (0..30).map(f64::from).collect();
    let lats = [-45.0f32, -15.0, 15.0, 45.0];
    let lons = [0.0f32, 60.0, 120.0, 180.0, 240.0, 300.0];
    let zones = ["south", "south_trop", "north_trop", "north"];

    // Cooler towards the poles, a slow warming trend, and a sensor that
    // drops out every few days on the last longitude.
    let mut temperature = Vec::with_capacity(days.len() * lats.len() * lons.len());
    for t in 0..days.len() {
        for &lat in &lats {
            for k in 0..lons.len() {
                let dropout = k == lons.len() - 1 && t % 7 == 3;
                let value = if dropout {
                    FILL
                } else {
                    let base = 28.0 - 0.35 * f64::from(lat.abs()) + 0.05 * t as f64;
                    rng.gauss(base, 0.8) as f32
                };
                temperature.push(value);
            }
        }
    }
    // One whole time step missing everywhere, for the row filter.
    let per_step = lats.len() * lons.len();
    for v in &mut temperature[10 * per_step..11 * per_step] {
        *v = FILL;
    }

    let output_path = "sample_data.nc";
    let mut nc = netcdf::create_with(output_path, Options::CLASSIC)
        .expect("Failed to create output file");
    nc.add_unlimited_dimension("time").expect("time dimension");
    nc.add_dimension("lat", lats.len()).expect("lat dimension");
    nc.add_dimension("lon", lons.len()).expect("lon dimension");
    nc.add_dimension("name_strlen", NAME_LEN)
        .expect("name_strlen dimension");

    nc.add_attribute("title", "Synthetic surface temperature")
        .expect("title");
    nc.add_attribute("Conventions", "CF-1.8").expect("Conventions");

    let mut var = nc.add_variable::<f64>("time", &["time"]).expect("time");
    var.put_attribute("units", "days since 2024-01-01 00:00:00")
        .expect("time units");
    var.put_attribute("calendar", "standard").expect("calendar");
    let mut var = nc.add_variable::<f32>("lat", &["lat"]).expect("lat");
    var.put_attribute("units", "degrees_north").expect("lat units");
    let mut var = nc.add_variable::<f32>("lon", &["lon"]).expect("lon");
    var.put_attribute("units", "degrees_east").expect("lon units");
    let mut var = nc
        .add_variable::<f32>("temperature", &["time", "lat", "lon"])
        .expect("temperature");
    var.put_attribute("units", "degC").expect("temperature units");
    var.put_attribute("_FillValue", FILL).expect("fill value");
    nc.add_variable::<NcChar>("zone_name", &["lat", "name_strlen"])
        .expect("zone_name");

    // Classic files hold definitions before data.
    nc.enddef().expect("Failed to leave define mode");

    let mut var = nc.variable_mut("time").expect("time");
    var.put_values(&days, ..).expect("time values");
    let mut var = nc.variable_mut("lat").expect("lat");
    var.put_values(&lats, ..).expect("lat values");
    let mut var = nc.variable_mut("lon").expect("lon");
    var.put_values(&lons, ..).expect("lon values");
    let mut var = nc.variable_mut("temperature").expect("temperature");
    var.put_values(&temperature, (0..days.len(), .., ..))
        .expect("temperature values");
    let mut var = nc.variable_mut("zone_name").expect("zone_name");
    var.put_values(&NcChar::from_bytes(&zone_names(&zones)), ..)
        .expect("zone names");
    nc.close().expect("Failed to write output file");

    println!(
        "Wrote {} x {} x {} temperature grid to {output_path}",
        days.len(),
        lats.len(),
        lons.len()
    );
}
