// tests/pipeline.rs
//! Bytes from a chartplotter through capture, assembly, export and merge.

use nmea_tools::{
    capture::{load_capture, write_capture},
    display::NullObserver,
    gpx::read_gpx,
    nmea::encode_frame,
    *,
};
use std::{
    fs::File,
    io::Cursor,
    sync::{atomic::AtomicBool, Arc},
};

fn plotter_stream() -> String {
    let mut stream = String::new();
    stream.push_str(&encode_frame(&[
        "GPRMC", "162823.000", "A", "3740.7220", "N", "07611.6160", "W", "0.14", "59.53", "040617", "", "",
    ]));
    stream.push_str("garbage between frames\r\n");
    stream.push_str(&encode_frame(&Waypoint::new("CHES 59A", 37.67871, -76.19362).to_wpl_fields()));
    stream.push_str(&encode_frame(&Waypoint::new("HOME", 38.9729, -76.4811).to_wpl_fields()));
    stream.push_str(&encode_frame(&[
        "GPGGA", "162824.000", "3740.7220", "N", "07611.6160", "W", "1", "07", "1.2", "3.1", "M", "-34.0", "M", "", "0000",
    ]));
    stream.push_str("$GPWPL,3740.722,N,07611.616,W,CORRUPT*00\r\n");
    stream.push_str(&encode_frame(&["GPRTE", "2", "1", "c", "HOMERUN", "CHES 59A"]));
    stream.push_str(&encode_frame(&["GPRTE", "2", "2", "c", "HOMERUN", "HOME"]));
    stream
}

#[test]
fn test_capture_assemble_merge() {
    let dir = tempfile::tempdir().unwrap();
    let capture_path = dir.path().join("route.json");

    let stats = run_capture(
        Cursor::new(plotter_stream()),
        FilterConfig::default(),
        Arc::new(AtomicBool::new(true)),
        NullObserver,
        File::create(&capture_path).unwrap(),
    )
    .unwrap();
    assert_eq!(stats.retained, 4);
    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.scan.checksum_errors, 1);

    let sentences = load_capture(&capture_path).unwrap();
    let assembly = Assembler::assemble("UPDATE", &sentences);
    assert_eq!(assembly.waypoints.len(), 2);
    assert_eq!(assembly.routes.len(), 1);
    assert_eq!(assembly.routes[0].members, vec!["CHES 59A", "HOME"]);
    assert!(assembly.routes[0].is_complete());

    let gpx_path = dir.path().join("route.gpx");
    let mut exporter = WaypointExporter::new("route.json", "Captured");
    exporter.add_waypoints(&assembly.waypoints);
    for route in assembly.routes.clone() {
        exporter.add_route(route);
    }
    exporter.export_to_file(&gpx_path, WaypointFormat::GPX).unwrap();

    let document = read_gpx(&gpx_path).unwrap();
    assert_eq!(document.routes[0].members, vec!["CHES 59A", "HOME"]);
    let update = document.into_set("UPDATE");

    let master = WaypointSet::from_waypoints(
        "MASTER",
        vec![
            Waypoint::new("Chesapeake 59A", 37.6787, -76.1936),
            Waypoint::new("Thomas Point", 38.8990, -76.4360),
        ],
    );
    let outcome = Reconciler::default().merge(&master, &update);
    let names: Vec<&str> = outcome.merged.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Chesapeake 59A", "Thomas Point", "HOME"]);
    assert_eq!(outcome.audit.len(), 1);
    assert_eq!(outcome.audit[0].update_name, "CHES 59A");
}

#[test]
fn test_capture_replay_keeps_raw_fields() {
    let decoder = SentenceDecoder::new();
    let sentences = vec![
        decoder.decode_payload("GPWPL,5128.620,N,00027.580,W,EGLL").unwrap(),
        decoder.decode_payload("GPRTE,1,1,w,LHR,EGLL").unwrap(),
    ];

    let mut written = Vec::new();
    write_capture(&mut written, &sentences).unwrap();
    let replayed = capture::read_capture(Cursor::new(written)).unwrap();

    let payloads: Vec<String> = replayed.iter().map(Sentence::payload).collect();
    assert_eq!(payloads, vec!["GPWPL,5128.620,N,00027.580,W,EGLL", "GPRTE,1,1,w,LHR,EGLL"]);
    assert_eq!(replayed[1].data, sentences[1].data);
}
