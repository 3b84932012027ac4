mod support;

mod api_upload_router;
