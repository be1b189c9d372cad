use beach_scene::{
    config::PanelConfig,
    scene::{
        panel::{Panel, PanelHit, Row, Slider},
        parameters::{Parameter, SceneParameters},
    },
};

const SCREEN_WIDTH: f32 = 1000.0;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn should_snap_to_step_and_clamp_to_range() {
    let elevation = Slider::new("elevation", Parameter::Elevation, 0.0, 90.0, 0.1);
    assert!(close(elevation.snap(45.04), 45.0));
    assert!(close(elevation.snap(45.06), 45.1));
    assert_eq!(elevation.snap(-5.0), 0.0);
    assert_eq!(elevation.snap(120.0), 90.0);

    let size = Slider::new("size", Parameter::Size, 0.1, 10.0, 0.1);
    assert!(close(size.value_at(0.0), 0.1));
    assert!(close(size.value_at(1.0), 10.0));
    assert!(close(size.value_at(2.0), 10.0));
}

#[test]
fn should_map_values_to_fractions() {
    let azimuth = Slider::new("azimuth", Parameter::Azimuth, -180.0, 180.0, 0.1);
    assert!(close(azimuth.fraction(0.0), 0.5));
    assert!(close(azimuth.value_at(0.5), 0.0));
    assert_eq!(azimuth.fraction(500.0), 1.0);
    assert_eq!(azimuth.fraction(-500.0), 0.0);
}

#[test]
fn should_offer_sky_and_water_folders() {
    let panel = Panel::beach(PanelConfig::default());
    let titles: Vec<_> = panel.folders.iter().map(|f| f.title).collect();
    assert_eq!(titles, vec!["Sky", "Water"]);

    let labels: Vec<_> = panel
        .folders
        .iter()
        .flat_map(|f| f.sliders.iter().map(|s| s.label))
        .collect();
    assert_eq!(labels, vec!["elevation", "azimuth", "distortionScale", "size"]);

    let water = &panel.folders[1].sliders;
    assert_eq!((water[0].min, water[0].max), (0.0, 8.0));
    assert_eq!((water[1].min, water[1].max), (0.1, 10.0));
}

#[test]
fn should_hit_headers_and_sliders_in_the_top_right_corner() {
    let panel = Panel::beach(PanelConfig::default());
    // margin 8, width 260 and rows of 22 pixels
    assert_eq!(panel.hit(800.0, 15.0, SCREEN_WIDTH), Some(PanelHit::Header(0)));
    assert_eq!(panel.hit(800.0, 85.0, SCREEN_WIDTH), Some(PanelHit::Header(1)));
    assert_eq!(panel.hit(100.0, 15.0, SCREEN_WIDTH), None);
    assert_eq!(panel.hit(800.0, 500.0, SCREEN_WIDTH), None);

    match panel.hit(990.0, 40.0, SCREEN_WIDTH) {
        Some(PanelHit::Slider {
            folder,
            slider,
            fraction,
        }) => {
            assert_eq!((folder, slider), (0, 0));
            assert_eq!(fraction, 1.0);
        }
        other => panic!("expected the elevation slider, got {other:?}"),
    }
    match panel.hit(740.0, 63.0, SCREEN_WIDTH) {
        Some(PanelHit::Slider {
            folder,
            slider,
            fraction,
        }) => {
            assert_eq!((folder, slider), (0, 1));
            assert_eq!(fraction, 0.0);
        }
        other => panic!("expected the azimuth slider, got {other:?}"),
    }
}

#[test]
fn should_hide_sliders_of_closed_folders() {
    let mut panel = Panel::beach(PanelConfig::default());
    assert_eq!(panel.rows().len(), 6);

    panel.toggle(0);
    assert_eq!(
        panel.rows(),
        vec![
            Row::Header { folder: 0 },
            Row::Header { folder: 1 },
            Row::Slider {
                folder: 1,
                slider: 0
            },
            Row::Slider {
                folder: 1,
                slider: 1
            },
        ]
    );
    // the water header moved up into the second row
    assert_eq!(panel.hit(800.0, 40.0, SCREEN_WIDTH), Some(PanelHit::Header(1)));

    panel.toggle(0);
    assert_eq!(panel.rows().len(), 6);
}

#[test]
fn should_fit_geometry_into_its_capacity() {
    let mut panel = Panel::beach(PanelConfig::default());
    let parameters = SceneParameters::default();
    let capacity = panel.quad_capacity();
    for fps in 0..panel.stats.capacity() + 5 {
        panel.stats.push(fps as f32);
    }

    let (vertices, indices) = panel.geometry(&parameters, SCREEN_WIDTH, 600.0);
    assert_eq!(vertices.len(), capacity * 4);
    assert_eq!(indices.len(), capacity * 6);
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    for v in &vertices {
        assert!(v.position.iter().all(|c| (-1.0..=1.0).contains(c)), "{v:?}");
    }

    panel.toggle(1);
    let (vertices, indices) = panel.geometry(&parameters, SCREEN_WIDTH, 600.0);
    assert!(vertices.len() < capacity * 4);
    assert_eq!(indices.len() / 6, vertices.len() / 4);
}

#[test]
fn should_drag_along_the_track_anywhere_vertically() {
    let panel = Panel::beach(PanelConfig::default());
    // far below the panel, still tracks the horizontal position
    assert_eq!(panel.drag_fraction(0, 0, 2000.0, SCREEN_WIDTH), 1.0);
    assert_eq!(panel.drag_fraction(0, 0, 0.0, SCREEN_WIDTH), 0.0);
}

#[test]
fn should_draw_the_frame_rate_graph_in_the_top_left_corner() {
    let mut panel = Panel::beach(PanelConfig::default());
    let bounds = panel.stats_bounds();
    assert_eq!((bounds.x, bounds.y, bounds.w, bounds.h), (8.0, 8.0, 80.0, 48.0));
    // one pixel wide bars inside a three pixel border
    assert_eq!(panel.stats.capacity(), 74);
    assert!(panel.stats_bars().is_empty());

    panel.stats.push(30.0);
    panel.stats.push(60.0);
    let bars = panel.stats_bars();
    assert_eq!(bars.len(), 2);

    let (newest, older) = (bars[1], bars[0]);
    assert!(close(newest.x + newest.w, bounds.x + bounds.w - 3.0));
    assert!(close(newest.w, 1.0));
    assert!(close(newest.h, 42.0));
    assert!(close(older.h, 21.0));
    for bar in bars {
        assert!(close(bar.y + bar.h, bounds.y + bounds.h - 3.0));
    }
}
