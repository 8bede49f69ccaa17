//! Decode synthetic GRIB2 messages written by `test_utils::Grib2Builder`.

use bytes::Bytes;
use grib2_parser::{read_first_field, Grib2Error, Grib2Reader};
use test_utils::{assert_approx_eq, assert_values_approx_eq, create_test_grid, Grib2Builder};

#[test]
fn test_report_counts_decode_exactly() {
    let counts = vec![0.0, 5.0, 0.0, 3.0, 1.0, 0.0, 12.0, 0.0, 0.0];
    let data = Grib2Builder::new(3, 3).with_data(counts.clone()).build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let msg = reader.next_message().unwrap().unwrap();
    let values = msg.unpack_data().unwrap();

    assert_values_approx_eq!(values, counts, 1e-4);
    assert!(reader.next_message().unwrap().is_none());
}

#[test]
fn test_wide_range_within_packing_precision() {
    let values = create_test_grid(20, 10);
    let data = Grib2Builder::new(20, 10).with_data(values.clone()).build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let decoded = reader.next_message().unwrap().unwrap().unpack_data().unwrap();

    // 19009 spread over 16 bits: one step is 0.5
    assert_values_approx_eq!(decoded, values, 0.5);
}

#[test]
fn test_decimal_scale() {
    let values = vec![0.25, 1.5, 2.75, 0.0];
    let data = Grib2Builder::new(2, 2)
        .with_decimal_scale(2)
        .with_data(values.clone())
        .build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let msg = reader.next_message().unwrap().unwrap();
    assert_eq!(msg.data_representation.decimal_scale_factor, 2);
    assert_values_approx_eq!(msg.unpack_data().unwrap(), values, 1e-3);
}

#[test]
fn test_bitmap_points_decode_as_missing() {
    let values = vec![1.0, f32::NAN, 0.0, f32::NAN, 1.0, 1.0];
    let data = Grib2Builder::new(3, 2).with_data(values.clone()).build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let msg = reader.next_message().unwrap().unwrap();

    assert!(msg.bitmap.is_some());
    assert_eq!(msg.data_representation.num_data_points, 4);
    assert_values_approx_eq!(msg.unpack_data().unwrap(), values, 1e-4);
}

#[test]
fn test_constant_field_with_bitmap() {
    let values = vec![1.0, f32::NAN, 1.0, 1.0];
    let data = Grib2Builder::new(2, 2).with_data(values.clone()).build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let msg = reader.next_message().unwrap().unwrap();

    assert_eq!(msg.data_representation.bits_per_value, 0);
    assert_values_approx_eq!(msg.unpack_data().unwrap(), values, 0.0);
}

#[test]
fn test_grid_geometry_and_negative_coordinates() {
    let data = Grib2Builder::new(4, 3)
        .with_origin(52.0, -130.0)
        .with_increments(0.25, 0.5)
        .build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let msg = reader.next_message().unwrap().unwrap();
    assert_eq!(msg.grid_dims(), (3, 4));
    assert_eq!(msg.grid_definition.first_longitude_microdegrees, -130_000_000);
    assert_eq!(msg.grid_definition.last_latitude_microdegrees, 51_000_000);

    let spec = msg.grid_spec().unwrap();
    let last = spec.point_at(11).unwrap();
    assert_approx_eq!(last.lon, -129.25, 1e-9);
    assert_approx_eq!(last.lat, 51.0, 1e-9);

    let bbox = spec.bbox();
    assert_approx_eq!(bbox.min_x, -130.0, 1e-9);
    assert_approx_eq!(bbox.max_y, 52.0, 1e-9);
}

#[test]
fn test_south_to_north_scanning() {
    let data = Grib2Builder::new(2, 3)
        .with_origin(20.0, 100.0)
        .with_scanning_mode(0x40)
        .build();

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let spec = reader.next_message().unwrap().unwrap().grid_spec().unwrap();

    let lats: Vec<f64> = spec.points().map(|p| p.lat).collect();
    assert_eq!(lats, vec![20.0, 20.0, 21.0, 21.0, 22.0, 22.0]);
}

#[test]
fn test_multiple_messages_with_padding() {
    let mut data = Grib2Builder::new(2, 1).with_data(vec![1.0, 2.0]).build();
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend(
        Grib2Builder::new(2, 1)
            .with_reference_time(2021, 9, 2, 0)
            .with_data(vec![3.0, 4.0])
            .build(),
    );

    let mut reader = Grib2Reader::new(Bytes::from(data));
    let first = reader.next_message().unwrap().unwrap();
    let second = reader.next_message().unwrap().unwrap();
    assert!(reader.next_message().unwrap().is_none());

    assert_values_approx_eq!(first.unpack_data().unwrap(), vec![1.0, 2.0], 1e-4);
    assert_values_approx_eq!(second.unpack_data().unwrap(), vec![3.0, 4.0], 1e-4);
    assert_eq!(
        second.reference_time().format("%Y%m%d%H").to_string(),
        "2021090200"
    );
}

#[test]
fn test_read_first_field_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.grib");
    std::fs::write(
        &path,
        Grib2Builder::new(3, 1).with_data(vec![1.0, 0.0, 1.0]).build(),
    )
    .unwrap();

    let field = read_first_field(&path).unwrap();
    assert_eq!(field.field.len(), 3);
    assert_eq!(field.field.values(), &[1.0, 0.0, 1.0]);
    assert_eq!(field.parameter_category, 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_first_field(dir.path().join("absent.grib"));
    assert!(matches!(result, Err(Grib2Error::Io(_))));
}

#[test]
fn test_not_a_grib_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    std::fs::write(&path, "AREA_AFFECTED_CENTRE_LAT,AREA_AFFECTED_CENTRE_LON\n").unwrap();

    assert!(matches!(
        read_first_field(&path),
        Err(Grib2Error::NoMessages)
    ));
}
