use approx::assert_relative_eq;
use celestial_core::constants::{FOUR_PI, TWOPI};
use celestial_core::SkyDir;
use celestial_healpix::{Disc, HealPixel};
use celestial_photons::{
    EnergyBinning, Photon, PhotonMap, PhotonMapError, SkyFunction, SkySpectrum, DEFAULT_TABLE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

fn random_photons(seed: u64, n: usize) -> Vec<Photon> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let z: f64 = rng.random_range(-1.0..1.0);
            let phi: f64 = rng.random_range(0.0..TWOPI);
            let log_e: f64 = rng.random_range(1.7..5.0);
            Photon::new(SkyDir::from_z_phi(z, phi), 10f64.powf(log_e))
        })
        .collect()
}

/// Photons bunched around a few directions, so cones hit several levels.
fn clustered_photons(seed: u64, n: usize) -> Vec<Photon> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centres = [(83.6, 22.0), (128.8, -45.2), (266.4, -28.9), (0.0, 89.0)];
    (0..n)
        .map(|i| {
            let (ra, dec) = centres[i % centres.len()];
            let ra = ra + rng.random_range(-6.0..6.0);
            let dec = (dec + rng.random_range(-6.0..6.0f64)).clamp(-90.0, 90.0);
            let energy = 100.0 * 10f64.powf(rng.random_range(-0.2..3.0));
            Photon::new(SkyDir::from_radec_deg(ra, dec), energy)
        })
        .collect()
}

fn filled_map(photons: &[Photon]) -> PhotonMap {
    let mut map = PhotonMap::default();
    map.extend(photons);
    map
}

#[test]
fn totals_track_insertions() {
    let photons = random_photons(1, 5000);
    let mut map = PhotonMap::default();
    let mut distinct = BTreeSet::new();

    for (n, photon) in photons.iter().enumerate() {
        map.add_photon(photon);
        distinct.insert(map.pixel(photon));
        assert_eq!(map.total_photons(), n as u64 + 1);
        assert_eq!(map.pixel_count(), distinct.len());
    }

    let summed: u64 = map.iter().map(|(_, c)| c).sum();
    assert_eq!(summed, map.total_photons());
}

#[test]
fn childless_cells_ignore_include_children() {
    let map = filled_map(&clustered_photons(2, 3000));
    let mut checked = 0;
    for (pixel, _) in map.iter() {
        if map.counts().descendants(pixel).next().is_some() {
            continue;
        }
        checked += 1;
        for weighted in [false, true] {
            assert_eq!(
                map.photon_count(&pixel, true, weighted),
                map.photon_count(&pixel, false, weighted)
            );
        }
    }
    assert!(checked > 0);

    let absent = HealPixel::new(13, 12345).unwrap();
    assert_eq!(map.photon_count(&absent, true, true), 0.0);
}

#[test]
fn subtree_counts_match_full_scan() {
    let map = filled_map(&clustered_photons(3, 4000));
    let probes: BTreeSet<_> = map
        .iter()
        .filter_map(|(p, _)| p.ancestor(4))
        .collect();

    for cell in probes {
        let mut plain = 0.0;
        let mut weighted = 0.0;
        for (pixel, count) in map.iter().filter(|(p, _)| cell.contains(p)) {
            plain += count as f64;
            let scale = if pixel == cell { 1.0 } else { pixel.area() / cell.area() };
            weighted += scale * count as f64;
        }
        assert_eq!(map.photon_count(&cell, true, false), plain);
        assert_relative_eq!(map.photon_count(&cell, true, true), weighted, max_relative = 1e-12);
        assert_relative_eq!(map.photon_count_with_dir(&cell).0, weighted, max_relative = 1e-12);
    }
}

#[test]
fn centroid_lies_inside_parent() {
    let map = filled_map(&clustered_photons(4, 2000));
    let cell = HealPixel::from_dir(&SkyDir::from_radec_deg(83.6, 22.0), 3);
    let (count, dir) = map.photon_count_with_dir(&cell);
    assert!(count > 0.0);
    assert!(cell.dir().difference(&dir) <= cell.max_radius());

    let single = HealPixel::new(9, 777).unwrap();
    let mut lonely = PhotonMap::default();
    lonely.add_pixel(single, 3);
    let (count, dir) = lonely.photon_count_with_dir(&single.ancestor(6).unwrap());
    assert_relative_eq!(count, 3.0 / 64.0);
    assert!(dir.difference(&single.dir()) < 1e-12);
}

#[test]
fn extract_conserves_counts() {
    let map = filled_map(&clustered_photons(5, 4000));
    let cases = [
        (SkyDir::from_radec_deg(83.6, 22.0), 3.0),
        (SkyDir::from_radec_deg(128.8, -45.2), 10.0),
        (SkyDir::from_radec_deg(0.0, 89.0), 5.0),
        (SkyDir::from_radec_deg(266.4, -28.9), 0.3),
        (SkyDir::from_radec_deg(200.0, 0.0), 20.0),
        (SkyDir::from_radec_deg(10.0, 10.0), 180.0),
    ];

    for (dir, radius) in cases {
        let disc = Disc::from_degrees(dir, radius);
        let inside: Vec<_> = map.iter().filter(|(p, _)| disc.contains_pixel(p)).collect();
        let expected: u64 = inside.iter().map(|(_, c)| *c).sum();

        let (cells, total) = map.extract(&dir, radius, None, None);
        assert_eq!(total, expected, "centre {dir} radius {radius}");

        let keys: BTreeSet<_> = cells.iter().map(|(p, _)| *p).collect();
        assert_eq!(keys.len(), cells.len(), "duplicate cells");
        assert_eq!(cells.iter().map(|(_, c)| c).sum::<u64>(), total);

        let mut folded: BTreeMap<HealPixel, u64> = BTreeMap::new();
        for (pixel, count) in &inside {
            let key = pixel.ancestor(map.min_level()).unwrap_or(*pixel);
            *folded.entry(key).or_default() += *count;
        }
        assert_eq!(cells, folded.into_iter().collect::<Vec<_>>());
    }
}

#[test]
fn extract_with_select_level_keeps_one_level() {
    let map = filled_map(&clustered_photons(6, 3000));
    let dir = SkyDir::from_radec_deg(128.8, -45.2);
    let disc = Disc::from_degrees(dir, 8.0);

    for level in map.min_level()..map.min_level() + map.levels() {
        let (cells, total) = map.extract(&dir, 8.0, None, Some(level));
        let expected: Vec<_> = map
            .counts()
            .level(level)
            .filter(|(p, _)| disc.contains_pixel(p))
            .collect();
        assert_eq!(cells, expected);
        assert_eq!(total, expected.iter().map(|(_, c)| c).sum::<u64>());

        let (single, single_total) = map.extract_level(&dir, 8.0, Some(level), false);
        assert_eq!(single, cells);
        assert_eq!(single_total, total);
    }
}

#[test]
fn extract_with_coarse_summary_level() {
    let map = filled_map(&clustered_photons(7, 2000));
    let dir = SkyDir::from_radec_deg(266.4, -28.9);
    let (cells, total) = map.extract(&dir, 8.0, Some(3), None);
    assert!(cells.iter().all(|(p, _)| p.level() == 3));
    let (fine, fine_total) = map.extract(&dir, 8.0, Some(12), None);
    assert_eq!(total, fine_total);
    assert!(fine.len() >= cells.len());
}

#[test]
fn whole_sky_hole_filling_covers_every_cell_once() {
    let map = filled_map(&random_photons(8, 3000));
    let level = 3;
    let (cells, total) =
        map.extract_level(&SkyDir::from_radec_deg(42.0, -7.0), 180.0, Some(level), true);

    assert_eq!(cells.len(), 12 * 4usize.pow(u32::from(level)));
    let expected: Vec<_> = HealPixel::level_pixels(level).collect();
    assert_eq!(cells.iter().map(|(p, _)| *p).collect::<Vec<_>>(), expected);
    for (pixel, count) in &cells {
        assert_eq!(*count, map.counts().get(pixel));
    }
    assert_eq!(total, cells.iter().map(|(_, c)| c).sum::<u64>());

    let default_level = map.extract_level(&SkyDir::from_radec_deg(0.0, 0.0), 180.0, None, true);
    assert_eq!(default_level.0.len(), 12 * 4usize.pow(6));
    let stored: u64 = map.counts().level(6).map(|(_, c)| c).sum();
    assert_eq!(default_level.1, stored);
}

#[test]
fn roundtrip_through_fits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("allsky.fits");

    let mut map = PhotonMap::new(EnergyBinning::new(30.0, 1.8, 10, 4).unwrap());
    map.extend(&random_photons(9, 4000));
    map.add_pixel(HealPixel::new(4, 3).unwrap(), 250);
    map.set_name("all sky, 'front' events");
    map.write(&path, DEFAULT_TABLE, true).unwrap();

    let loaded = PhotonMap::read(&path, DEFAULT_TABLE).unwrap();
    assert_eq!(loaded.binning(), map.binning());
    assert_eq!(loaded.name(), map.name());
    assert_eq!(loaded.total_photons(), map.total_photons());
    assert_eq!(loaded.pixel_count(), map.pixel_count());
    assert!(loaded.iter().eq(map.iter()));
    assert_eq!(loaded.energy_bins(), map.energy_bins());
}

#[test]
fn no_clobber_refuses_existing_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("maps.fits");
    let map = filled_map(&random_photons(10, 100));

    map.write(&path, "FRONT", true).unwrap();
    let err = map.write(&path, "FRONT", false).unwrap_err();
    assert!(matches!(err, PhotonMapError::TableExists { .. }));

    map.write(&path, "BACK", false).unwrap();
    assert_eq!(PhotonMap::read(&path, "front").unwrap(), map);
    assert_eq!(PhotonMap::read(&path, "back").unwrap(), map);
}

#[test]
fn bin_boundaries() {
    let binning = EnergyBinning::default();
    let map = PhotonMap::new(binning);
    let dir = SkyDir::from_radec_deg(1.0, 2.0);

    for (i, edge) in map.energy_bins().into_iter().enumerate() {
        let photon = Photon::new(dir, edge);
        assert_eq!(map.pixel(&photon).level(), binning.min_level() + i as u8);
    }
    assert_eq!(map.pixel(&Photon::new(dir, 20.0)).level(), binning.min_level());
    assert_eq!(map.pixel(&Photon::new(dir, 1e9)).level(), binning.max_level());
}

#[test]
fn two_band_example() {
    let binning = EnergyBinning::new(100.0, 2.35, 2, 6).unwrap();
    let bins = binning.energy_bins();
    assert_eq!(bins.len(), 2);
    assert_relative_eq!(bins[0], 100.0);
    assert_relative_eq!(bins[1], 235.0, max_relative = 1e-12);
    assert_eq!(binning.bin_level(150.0), 6);
    assert_eq!(binning.bin_level(500.0), 7);
}

#[test]
fn sky_function_interfaces() {
    let photons = random_photons(11, 20000);
    let mut map = filled_map(&photons);
    map.set_name("galactic");

    let spectrum: &dyn SkySpectrum = &map;
    assert_eq!(spectrum.name(), "galactic");

    let dir = *photons[0].dir();
    let bins = map.energy_bins();
    let band_sum: f64 = bins.iter().map(|&e| spectrum.value(&dir, e)).sum();
    assert_relative_eq!(spectrum.evaluate(&dir), band_sum, max_relative = 1e-12);
    assert_eq!(spectrum.integral(&dir, bins[0], bins[1]), spectrum.value(&dir, bins[0]));

    // Every photon lands in exactly one band: summing count/area · area over
    // all pixels of all levels gives back the total.
    let recovered: f64 = map
        .iter()
        .map(|(p, _)| {
            let band_energy = map.binning().level_energy(p.level()).unwrap();
            map.value(&p.dir(), band_energy) * p.area()
        })
        .sum();
    assert_relative_eq!(recovered, photons.len() as f64, max_relative = 1e-9);
    assert!(map.density(&dir) * FOUR_PI > 0.0);
}
