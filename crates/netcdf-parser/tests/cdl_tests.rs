//! Tests for CDL parsing, inference from CDL metadata and CDL output.

use geo_common::{PixelPos, RasterDimension};
use geocoding::{
    infer_geocoding, plan_geocoding_output, AttributeView, Convention, Geocoding, GeocodingConfig,
    GeocodingWriter, MetadataError, MetadataSource, Orientation, Product, RasterModel,
};
use netcdf_parser::{dump_netcdf, read_cdl_file, CdlDocument, CdlWriter, NetCdfError};
use test_utils::{
    assert_approx_eq, temp_test_dir, CDL_CF_NORTH_FIRST, CDL_CF_SOUTH_FIRST, CDL_COARDS_BOUNDS,
};

/// 3x2 swath with per-pixel latitude/longitude and one data band.
const CDL_SWATH: &str = r#"netcdf swath {
dimensions:
	y = 2 ;
	x = 3 ;
variables:
	float lat(y, x) ;
		lat:valid_pixel_expression = "lat > -90" ;
	float lon(y, x) ;
	float rad(y, x) ;
data:

 lat = 50, 50, 50, 49, 49, 49 ;

 lon = 4, 4.5, 5, 4, 4.5, 5 ;

 rad = 1, 2, _, 4, 5, 6 ;
}
"#;

fn infer(doc: &CdlDocument, product: &Product) -> geocoding::InferredGeocoding {
    infer_geocoding(doc, product, &GeocodingConfig::default()).expect("geocoding inferred")
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_cf_document() {
    let doc = CdlDocument::parse(CDL_CF_NORTH_FIRST).unwrap();

    assert_eq!(doc.name(), "cf_north_first");
    assert_eq!(doc.dimensions().len(), 2);
    assert_eq!(doc.shape("lon"), Some(vec![4]));
    assert_eq!(doc.shape("chl"), Some(vec![3, 4]));
    assert_eq!(doc.values("lat"), Some(&[50.0, 49.0, 48.0][..]));

    let chl = doc.variable("chl").unwrap();
    assert_eq!(chl.data_type, "float");
    assert_eq!(chl.dimensions, vec!["lat".to_string(), "lon".to_string()]);
    assert_eq!(chl.attributes.numeric("_FillValue"), Some(-999.0));
    assert_eq!(
        chl.attributes.string("long_name"),
        Some("chlorophyll concentration")
    );
    assert_eq!(doc.global_attributes().string("Conventions"), Some("CF-1.4"));
    assert_eq!(doc.raster_dimension(), Some(RasterDimension::new(4, 3)));
}

#[test]
fn test_parse_unlimited_dimension() {
    let doc = CdlDocument::parse(CDL_COARDS_BOUNDS).unwrap();

    let time = doc.dimension("time").unwrap();
    assert!(time.unlimited);
    assert_eq!(time.len, 1);
    assert_eq!(doc.shape("sst"), Some(vec![1, 50, 100]));
    assert_eq!(doc.raster_dimension(), Some(RasterDimension::new(100, 50)));
}

#[test]
fn test_header_only_samples_are_short_reads() {
    let doc = CdlDocument::parse(CDL_COARDS_BOUNDS).unwrap();

    assert!(matches!(
        doc.read_samples("latitude", 2),
        Err(MetadataError::ShortRead { available: 0, .. })
    ));
    assert!(matches!(
        doc.read_samples("sea_level", 2),
        Err(MetadataError::UnknownVariable(_))
    ));
}

#[test]
fn test_product_bands_from_data() {
    let doc = CdlDocument::parse(CDL_SWATH).unwrap();
    let product = doc.to_product().unwrap();

    assert_eq!(product.name(), "swath");
    assert_eq!(product.dimension(), RasterDimension::new(3, 2));
    assert_eq!(product.bands().len(), 3);

    let lat = product.band("lat").unwrap();
    assert_eq!(lat.valid_pixel_expression(), Some("lat > -90"));
    assert!(product.band("rad").unwrap().data()[2].is_nan());
}

#[test]
fn test_product_sized_from_axes_alone() {
    let doc = CdlDocument::parse(CDL_CF_SOUTH_FIRST).unwrap();
    let product = doc.to_product().unwrap();
    assert_eq!(product.dimension(), RasterDimension::new(4, 3));
    assert!(product.bands().is_empty());
}

#[test]
fn test_product_without_any_extent() {
    let doc = CdlDocument::parse(
        "netcdf flat {\ndimensions:\n\tt = 5 ;\nvariables:\n\tdouble time(t) ;\n}\n",
    )
    .unwrap();
    assert_eq!(doc.raster_dimension(), None);
    assert!(matches!(doc.to_product(), Err(NetCdfError::MissingData(_))));
}

#[test]
fn test_read_cdl_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("coards.cdl");
    std::fs::write(&path, CDL_COARDS_BOUNDS).unwrap();

    let doc = read_cdl_file(&path).unwrap();
    assert!(doc.has_variable("longitude"));

    assert!(matches!(
        read_cdl_file(dir.path().join("missing.cdl")),
        Err(NetCdfError::IoError(_))
    ));
}

#[test]
fn test_dump_missing_file_is_command_error() {
    let dir = temp_test_dir();
    let result = dump_netcdf(dir.path().join("missing.nc"));
    assert!(matches!(result, Err(NetCdfError::CommandError(_))));
}

// ============================================================================
// Inference from CDL metadata
// ============================================================================

#[test]
fn test_infer_cf_north_first() {
    let doc = CdlDocument::parse(CDL_CF_NORTH_FIRST).unwrap();
    let product = doc.to_product().unwrap();
    let inferred = infer(&doc, &product);

    assert_eq!(inferred.convention, Some(Convention::Cf));
    assert_eq!(inferred.orientation, Orientation::Natural);

    let ul = inferred.geocoding.pixel_to_geo(PixelPos::new(0.5, 0.5)).unwrap();
    assert_approx_eq!(ul.lon, 4.0, 1e-9);
    assert_approx_eq!(ul.lat, 50.0, 1e-9);
    let br = inferred.geocoding.pixel_to_geo(PixelPos::new(3.5, 2.5)).unwrap();
    assert_approx_eq!(br.lon, 5.5, 1e-9);
    assert_approx_eq!(br.lat, 48.0, 1e-9);
}

#[test]
fn test_infer_cf_south_first() {
    let doc = CdlDocument::parse(CDL_CF_SOUTH_FIRST).unwrap();
    let product = Product::new("south", RasterDimension::new(4, 3));
    let inferred = infer(&doc, &product);

    assert_eq!(inferred.orientation, Orientation::Flipped);
    let ul = inferred.geocoding.pixel_to_geo(PixelPos::new(0.5, 0.5)).unwrap();
    assert_approx_eq!(ul.lat, 50.0, 1e-9);
    assert_approx_eq!(ul.lon, 4.0, 1e-9);
}

#[test]
fn test_infer_coards_bounds() {
    let doc = CdlDocument::parse(CDL_COARDS_BOUNDS).unwrap();
    let product = doc.to_product().unwrap();
    let inferred = infer(&doc, &product);

    assert_eq!(inferred.convention, Some(Convention::Coards));
    assert_eq!(inferred.orientation, Orientation::Flipped);
    let Geocoding::Affine(affine) = &inferred.geocoding else {
        panic!("expected affine geocoding");
    };
    assert_approx_eq!(affine.pixel_size_x(), 0.1, 1e-12);
    assert_approx_eq!(affine.pixel_size_y(), 1.0, 1e-12);

    let bottom_left = inferred.geocoding.pixel_to_geo(PixelPos::new(0.5, 49.5)).unwrap();
    assert_approx_eq!(bottom_left.lon, 0.0, 1e-9);
    assert_approx_eq!(bottom_left.lat, 0.0, 1e-9);
}

#[test]
fn test_infer_swath_falls_back_to_pixel_grid() {
    let doc = CdlDocument::parse(CDL_SWATH).unwrap();
    let product = doc.to_product().unwrap();
    let inferred = infer(&doc, &product);

    assert_eq!(inferred.convention, None);
    let Geocoding::PixelGrid(grid) = &inferred.geocoding else {
        panic!("expected pixel geocoding");
    };
    assert_eq!(grid.valid_mask(), Some("lat > -90"));

    let pos = inferred.geocoding.pixel_to_geo(PixelPos::center(2, 1)).unwrap();
    assert_approx_eq!(pos.lat, 49.0, 1e-6);
    assert_approx_eq!(pos.lon, 5.0, 1e-6);
}

// ============================================================================
// CDL output
// ============================================================================

#[test]
fn test_axes_output_round_trips_through_cdl() {
    let doc = CdlDocument::parse(CDL_CF_NORTH_FIRST).unwrap();
    let product = doc.to_product().unwrap();
    let inferred = infer(&doc, &product);
    let dimension = product.dimension();

    let plan = plan_geocoding_output(&inferred.geocoding, dimension);
    let writer = GeocodingWriter::new(
        &inferred.geocoding,
        dimension,
        plan.output_orientation(),
        GeocodingConfig::default(),
    )
    .unwrap();
    let mut cdl = CdlWriter::new("axes");
    writer.declare(&mut cdl).unwrap();
    writer.write(&mut cdl).unwrap();

    let rendered = CdlDocument::parse(&cdl.render()).unwrap();
    assert_eq!(rendered.shape("lat"), Some(vec![3]));
    assert_eq!(rendered.shape("lon"), Some(vec![4]));
    assert_eq!(rendered.values("lat"), None);

    let lat = rendered.attributes("lat").unwrap();
    assert_approx_eq!(lat.numeric("valid_min").unwrap(), 48.0, 1e-9);
    assert_approx_eq!(lat.numeric("valid_max").unwrap(), 50.0, 1e-9);
    let lon = rendered.attributes("lon").unwrap();
    assert_approx_eq!(lon.numeric("valid_min").unwrap(), 4.0, 1e-9);
    assert_approx_eq!(lon.numeric("valid_max").unwrap(), 5.5, 1e-9);
}

#[test]
fn test_dense_output_is_stored_bottom_up() {
    let doc = CdlDocument::parse(CDL_SWATH).unwrap();
    let product = doc.to_product().unwrap();
    let inferred = infer(&doc, &product);
    let dimension = product.dimension();

    let plan = plan_geocoding_output(&inferred.geocoding, dimension);
    assert!(plan.needs_sampling());
    let config = GeocodingConfig {
        parallel_sampling: false,
        ..GeocodingConfig::default()
    };
    let writer =
        GeocodingWriter::new(&inferred.geocoding, dimension, plan.output_orientation(), config)
            .unwrap();

    let dir = temp_test_dir();
    let path = dir.path().join("swath_geo.cdl");
    let mut cdl = CdlWriter::new("swath_geo");
    writer.declare(&mut cdl).unwrap();
    writer.write(&mut cdl).unwrap();
    cdl.write_to(&path).unwrap();

    let rendered = read_cdl_file(&path).unwrap();
    assert_eq!(rendered.shape("lat"), Some(vec![2, 3]));
    assert_eq!(
        rendered.values("lat"),
        Some(&[49.0, 49.0, 49.0, 50.0, 50.0, 50.0][..])
    );
    assert_eq!(
        rendered.values("lon"),
        Some(&[4.0, 4.5, 5.0, 4.0, 4.5, 5.0][..])
    );
    assert!(rendered.has_variable("x"));
    assert!(rendered.has_variable("y"));
}
