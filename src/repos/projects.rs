//! Projects repo, presents CRUD operations with db for booking groups

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{InsertProject, Project, ProjectFilter, ProjectPaymentStatus, UpdateProject, Visibility};
use repos::pagination::Paginate;
use repos::types::RepoResult;
use schema::projects::dsl::*;

/// Projects repository, responsible for handling project rows
pub struct ProjectsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait ProjectsRepo {
    /// Find specific project by id
    fn find(&self, project_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Project>>;

    /// Paginated listing with filters
    fn list(&self, filter: ProjectFilter, skip: i64, limit: i64) -> RepoResult<(Vec<Project>, i64)>;

    /// Creates new project
    fn create(&self, payload: InsertProject) -> RepoResult<Project>;

    /// Updates specific project
    fn update(&self, project_id_arg: i32, payload: UpdateProject) -> RepoResult<Project>;

    /// Stores the derived payment rollup
    fn set_payment_status(&self, project_id_arg: i32, status_arg: ProjectPaymentStatus) -> RepoResult<Project>;

    /// Stamps `deleted_at`
    fn soft_delete(&self, project_id_arg: i32) -> RepoResult<Project>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProjectsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProjectsRepo
    for ProjectsRepoImpl<'a, T>
{
    fn find(&self, project_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Project>> {
        debug!("Find in projects with id {}.", project_id_arg);
        let query = projects.find(project_id_arg);
        let project = match visibility {
            Visibility::Active => query
                .filter(deleted_at.is_null())
                .get_result::<Project>(self.db_conn)
                .optional()?,
            Visibility::All => query.get_result::<Project>(self.db_conn).optional()?,
        };
        Ok(project)
    }

    fn list(&self, filter: ProjectFilter, skip: i64, limit: i64) -> RepoResult<(Vec<Project>, i64)> {
        debug!("List projects with filter {:?} skip {} limit {}.", filter, skip, limit);
        let mut query = projects.filter(deleted_at.is_null()).into_boxed();
        if let Some(client_id_arg) = filter.client_id {
            query = query.filter(client_id.eq(client_id_arg));
        }
        if let Some(status_arg) = filter.status {
            query = query.filter(status.eq(status_arg));
        }
        if let Some(from) = filter.start_date {
            query = query.filter(end_date.ge(from));
        }
        if let Some(to) = filter.end_date {
            query = query.filter(start_date.le(to));
        }
        query
            .order(start_date.desc())
            .paginate(skip, limit)
            .load_and_total::<Project, _>(self.db_conn)
            .map_err(|e| e.context("List projects error occured").into())
    }

    fn create(&self, payload: InsertProject) -> RepoResult<Project> {
        debug!("Create project {:?}.", payload);
        diesel::insert_into(projects)
            .values(&payload)
            .get_result::<Project>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create project {:?} error occured", payload)).into()
            })
    }

    fn update(&self, project_id_arg: i32, payload: UpdateProject) -> RepoResult<Project> {
        debug!("Updating project with id {} and payload {:?}.", project_id_arg, payload);
        let filter = projects.filter(id.eq(project_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<Project>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating project with id {} and payload {:?} error occured",
                    project_id_arg, payload
                )).into()
            })
    }

    fn set_payment_status(&self, project_id_arg: i32, status_arg: ProjectPaymentStatus) -> RepoResult<Project> {
        debug!("Set project {} payment status {}.", project_id_arg, status_arg);
        let filter = projects.filter(id.eq(project_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(payment_status.eq(status_arg))
            .get_result::<Project>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Set project {} payment status {} error occured",
                    project_id_arg, status_arg
                )).into()
            })
    }

    fn soft_delete(&self, project_id_arg: i32) -> RepoResult<Project> {
        debug!("Soft delete project with id {}.", project_id_arg);
        let filter = projects.filter(id.eq(project_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<Project>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Soft delete project with id {} error occured", project_id_arg))
                    .into()
            })
    }
}
