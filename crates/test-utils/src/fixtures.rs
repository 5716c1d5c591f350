//! Text fixtures representing the metadata layouts the geocoding readers
//! encounter in practice.

/// `ncdump` output for a CF product: 1-D `lon`/`lat` axes, latitude stored
/// north to south, 4x3 raster.
pub const CDL_CF_NORTH_FIRST: &str = r#"netcdf cf_north_first {
dimensions:
	lon = 4 ;
	lat = 3 ;
variables:
	float lon(lon) ;
		lon:units = "degrees_east" ;
		lon:standard_name = "longitude" ;
	float lat(lat) ;
		lat:units = "degrees_north" ;
		lat:standard_name = "latitude" ;
	float chl(lat, lon) ;
		chl:_FillValue = -999.f ;
		chl:long_name = "chlorophyll concentration" ;

// global attributes:
		:Conventions = "CF-1.4" ;
data:

 lon = 4, 4.5, 5, 5.5 ;

 lat = 50, 49, 48 ;
}
"#;

/// `ncdump` output for a CF product whose latitude axis is stored south to
/// north.
pub const CDL_CF_SOUTH_FIRST: &str = r#"netcdf cf_south_first {
dimensions:
	lon = 4 ;
	lat = 3 ;
variables:
	double lon(lon) ;
	double lat(lat) ;
data:

 lon = 4, 4.5, 5, 5.5 ;

 lat = 48, 49, 50 ;
}
"#;

/// `ncdump -h` output for a COARDS product describing its axes through
/// `valid_min`/`valid_max` bounds only.
pub const CDL_COARDS_BOUNDS: &str = r#"netcdf coards_bounds {
dimensions:
	longitude = 100 ;
	latitude = 50 ;
	time = UNLIMITED ; // (1 currently)
variables:
	float longitude(longitude) ;
		longitude:units = "degrees_east" ;
		longitude:valid_min = 0.f ;
		longitude:valid_max = 10.f ;
	float latitude(latitude) ;
		latitude:units = "degrees_north" ;
		latitude:valid_min = 0.f ;
		latitude:valid_max = 50.f ;
	short sst(time, latitude, longitude) ;
		sst:scale_factor = 0.01 ;
		sst:valid_pixel_expression = "sst > -5" ;
}
"#;

/// SPOT VGT style log-volume descriptor for a 100x200 raster at 0.01
/// degree resolution, upper-left corner at 4E 50N.
pub const VGT_LOG_HEADER: &str = "PRODUCT_ID              V2KRNS10__20060721E
MERIDIAN_ORIGIN         0
GEODETIC_SYST_NAME      WGS 1984
MAP_PROJ_UNIT           DEGREES
MAP_PROJ_RESOLUTION     0.01
GEO_UPPER_LEFT_LAT      50.0
GEO_UPPER_LEFT_LONG     4.0
IMAGE_UPPER_LEFT_COL    1
IMAGE_UPPER_LEFT_ROW    1
IMAGE_LOWER_RIGHT_COL   100
IMAGE_LOWER_RIGHT_ROW   200
";
