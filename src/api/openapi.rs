//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, book_instances, books, genres, health, jobs, languages, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "1.0.0",
        description = "Catalog of genres, languages, authors, books and their copies"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::patch_genre,
        genres::delete_genre,
        // Languages
        languages::list_languages,
        languages::get_language,
        languages::create_language,
        languages::update_language,
        languages::patch_language,
        languages::delete_language,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::patch_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::patch_book,
        books::delete_book,
        // Book instances
        book_instances::list_book_instances,
        book_instances::get_book_instance,
        book_instances::create_book_instance,
        book_instances::update_book_instance,
        book_instances::patch_book_instance,
        book_instances::delete_book_instance,
        // Users, groups, profiles
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::list_groups,
        users::get_group,
        users::create_group,
        users::delete_group,
        users::list_profiles,
        users::get_profile,
        users::update_profile,
        // Jobs
        jobs::submit_job,
        jobs::get_job,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            // Catalog
            crate::models::Genre,
            crate::models::genre::GenrePayload,
            crate::models::genre::PatchGenre,
            genres::GenresListResponse,
            crate::models::Language,
            crate::models::language::LanguagePayload,
            crate::models::language::PatchLanguage,
            languages::LanguagesListResponse,
            crate::models::Author,
            crate::models::author::AuthorPayload,
            crate::models::author::PatchAuthor,
            authors::AuthorsListResponse,
            crate::models::Book,
            crate::models::book::BookPayload,
            crate::models::book::PatchBook,
            books::BooksListResponse,
            crate::models::BookInstance,
            crate::models::LoanStatus,
            crate::models::book_instance::BookInstancePayload,
            crate::models::book_instance::PatchBookInstance,
            book_instances::BookInstancesListResponse,
            // Users
            crate::models::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::Group,
            crate::models::user::CreateGroup,
            crate::models::Profile,
            crate::models::user::UpdateProfile,
            users::UsersListResponse,
            users::GroupsListResponse,
            users::ProfilesListResponse,
            // Jobs
            crate::services::jobs::Job,
            crate::services::jobs::JobStatus,
            crate::services::jobs::JobReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "genres", description = "Book genres"),
        (name = "languages", description = "Book languages"),
        (name = "authors", description = "Authors"),
        (name = "books", description = "Books"),
        (name = "book-instances", description = "Physical copies of books"),
        (name = "users", description = "User, group and profile administration"),
        (name = "jobs", description = "Background jobs")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_paths_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/genres", "/authors/{id}", "/book-instances", "/jobs/{id}", "/ready"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
