mod common;

use common::{MemoryTileClient, TEMPLATE};
use image::Rgba;
use quakeview::core::config::LoaderConfig;
use quakeview::tiles::{RasterFetcher, UrlTemplate};
use quakeview::{Earthquake, SceneConfig, SceneManager, TerrainState};
use std::sync::Arc;
use std::time::Duration;

/// Background loading, generations and teardown of the scene manager
#[cfg(test)]
mod scene_lifecycle_tests {
    use super::*;

    // 128 * 256 + 200 - 32768 = 200 m, 0.6 km at 3x
    const DEM_200M: Rgba<u8> = Rgba([128, 200, 0, 255]);

    fn config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.imagery.url_template = UrlTemplate::new(TEMPLATE);
        config.imagery.zoom = 6;
        config.elevation.url_template = UrlTemplate::new(format!("{}?dem", TEMPLATE));
        config.elevation.zoom = 5;
        config.terrain.segments = 8;
        config.walls.segments_along = 4;
        config.walls.segments_depth = 2;
        config.walls.edge_segments = 8;
        config.loader = LoaderConfig::for_testing();
        config
    }

    fn fetcher(client: MemoryTileClient, config: &SceneConfig) -> Arc<RasterFetcher<MemoryTileClient>> {
        Arc::new(RasterFetcher::new(client, config.loader.clone(), config.tile_size))
    }

    fn events(n: usize) -> Vec<Earthquake> {
        (0..n)
            .map(|i| Earthquake {
                lat: 21.0 + i as f64 * 0.5,
                lon: 119.0 + i as f64 * 0.5,
                depth: 10.0 + i as f64 * 40.0,
                amplitude: 3.0 + (i % 4) as f64,
                time: format!("2024-04-0{}T00:00:00Z", 1 + i % 9),
                event_id: Some(format!("ev{}", i)),
            })
            .collect()
    }

    /// Polls the manager the way a frame loop would until every load settles
    async fn settle(scene: &mut SceneManager) -> usize {
        let mut applied = 0;
        for _ in 0..500 {
            applied += scene.update();
            if !scene.loads_pending() {
                return applied + scene.update();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("loads did not settle");
    }

    async fn wait_idle(scene: &SceneManager) {
        for _ in 0..500 {
            if !scene.loads_pending() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("loads did not finish");
    }

    #[tokio::test]
    async fn test_load_reaches_ready() {
        let config = config();
        let mut scene = SceneManager::new(config.clone()).unwrap();
        scene.set_events(events(7));
        assert_eq!(scene.geometry().markers.count(), 7);

        scene
            .start_loading(fetcher(MemoryTileClient::filled(DEM_200M), &config))
            .unwrap();
        assert_eq!(scene.state(), TerrainState::Fetching { generation: 1 });
        assert!(scene.geometry().terrain.positions.iter().all(|p| p[2] == 0.0));

        assert_eq!(settle(&mut scene).await, 2);
        assert_eq!(scene.state(), TerrainState::Ready);
        assert!(scene.imagery().is_some());
        assert!(scene.elevation().is_some());
        assert_eq!(scene.last_error(), None);
        for p in &scene.geometry().terrain.positions {
            assert!((p[2] - 0.6).abs() < 1e-4);
        }
        assert_eq!(scene.geometry().markers.count(), 7);
        assert_eq!(scene.geometry().walls.len(), 4);
    }

    #[tokio::test]
    async fn test_stale_generation_is_dropped() {
        let config = config();
        let mut scene = SceneManager::new(config.clone()).unwrap();

        // Generation 1 finishes but is never applied before generation 2 starts.
        scene
            .start_loading(fetcher(MemoryTileClient::filled(Rgba([10, 10, 10, 255])), &config))
            .unwrap();
        wait_idle(&scene).await;

        let slow = MemoryTileClient::filled(DEM_200M).with_delay(Duration::from_millis(30));
        scene.start_loading(fetcher(slow, &config)).unwrap();
        assert_eq!(scene.generation(), 2);

        assert_eq!(scene.update(), 0);
        assert_eq!(scene.state(), TerrainState::Fetching { generation: 2 });
        assert!(scene.imagery().is_none());

        settle(&mut scene).await;
        assert_eq!(scene.state(), TerrainState::Ready);
        let imagery = scene.imagery().unwrap();
        assert_eq!(imagery.pixel(0, 0), DEM_200M.0);
        assert!((scene.geometry().terrain.positions[0][2] - 0.6).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_reload_while_ready_keeps_ready() {
        let config = config();
        let mut scene = SceneManager::new(config.clone()).unwrap();
        let fetcher = fetcher(MemoryTileClient::filled(DEM_200M), &config);

        scene.start_loading(Arc::clone(&fetcher)).unwrap();
        settle(&mut scene).await;
        let requests = fetcher.client().requests();

        scene.start_loading(Arc::clone(&fetcher)).unwrap();
        assert_eq!(scene.state(), TerrainState::Ready);
        settle(&mut scene).await;
        assert_eq!(scene.state(), TerrainState::Ready);
        assert_eq!(scene.generation(), 2);
        // Every tile of the reload came from the cache.
        assert_eq!(fetcher.client().requests(), requests);
    }

    #[tokio::test]
    async fn test_failed_tiles_use_fallback_elevation() {
        let mut client = MemoryTileClient::filled(DEM_200M);
        for x in 0..64 {
            for y in 0..64 {
                client = client.fail(x, y);
            }
        }
        let config = config();
        let mut scene = SceneManager::new(config.clone()).unwrap();
        scene.start_loading(fetcher(client, &config)).unwrap();
        settle(&mut scene).await;

        // The grey fallback decodes to 128.5 m.
        assert!(scene.is_ready());
        for p in &scene.geometry().terrain.positions {
            assert!((p[2] - 0.3855).abs() < 1e-4);
        }
    }

    #[tokio::test]
    async fn test_dispose_mid_flight_ignores_results() {
        let config = config();
        let mut scene = SceneManager::new(config.clone()).unwrap();
        scene.set_events(events(3));
        let slow = MemoryTileClient::filled(DEM_200M).with_delay(Duration::from_millis(20));
        scene.start_loading(fetcher(slow, &config)).unwrap();

        scene.dispose();
        assert!(!scene.is_alive());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(scene.update(), 0);
        assert_eq!(scene.state(), TerrainState::Empty);
        assert!(scene.imagery().is_none());
        assert!(scene.geometry().is_empty());

        let again = scene.start_loading(fetcher(MemoryTileClient::new(), &config));
        assert!(again.is_err());
    }
}
